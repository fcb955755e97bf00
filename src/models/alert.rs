//! Normalized alert model.
//!
//! The event and content-type codes the portal emits are open-ended; the
//! classifier maps them onto these closed enums with a single explicit
//! `Unknown` arm. Consumers match exhaustively with no catch-all, so a value
//! outside the closed set is a compile error rather than a runtime surprise.

use serde::{Deserialize, Serialize};

/// Top-level event of an alert, tagged with the normalized event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AlertEvent {
    /// New course content was published
    #[serde(rename = "content:available")]
    ContentAvailable { content: ContentKind },

    /// A gradable item passed its due date
    #[serde(rename = "grade:overdue")]
    GradeOverdue,

    /// A course announcement was posted
    #[serde(rename = "announcement:available")]
    AnnouncementAvailable {
        /// Plain-text announcement body, when the portal supplied one
        announcement: Option<String>,
    },

    /// A grade was entered manually
    #[serde(rename = "grade:manual_update")]
    GradeManualUpdate,

    /// A new course became available to the student
    #[serde(rename = "course:available")]
    CourseAvailable,

    /// An assignment's due date was published
    #[serde(rename = "assignment:due_available")]
    AssignmentDueAvailable { assignment: String },

    /// A new assignment was published
    #[serde(rename = "assignment:available")]
    AssignmentAvailable { assignment: String },

    /// A grade attempt was updated
    #[serde(rename = "grade:update")]
    GradeUpdate { grade: String },

    /// Unrecognized server event code; diagnostic lives in `Alert::exception`
    #[serde(rename = "unknown")]
    Unknown,
}

/// Content sub-type for `AlertEvent::ContentAvailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "content_type")]
pub enum ContentKind {
    /// Downloadable file attachment
    #[serde(rename = "file")]
    File { file_url: String },

    /// Structured document page, interpretable via a follow-up fetch
    #[serde(rename = "document")]
    Document { doc_url: String },

    /// Blank page, only the original URL is meaningful
    #[serde(rename = "blank")]
    Blank,

    /// Mediasite page
    #[serde(rename = "media")]
    Media,

    /// Link into a course discussion forum
    #[serde(rename = "forum_link")]
    ForumLink,

    /// Embedded video
    #[serde(rename = "video")]
    Video,

    /// Link to an external site
    #[serde(rename = "external_link")]
    ExternalLink,

    /// Unrecognized content-handler string
    #[serde(rename = "unknown")]
    Unknown,
}

/// One normalized notification, produced by the classifier and consumed
/// once by the dispatcher. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Classified event with its variant-specific payload
    #[serde(flatten)]
    pub event: AlertEvent,

    /// Notification title as reported by the portal
    pub title: String,

    /// Course identifier, e.g. `_4069_1`
    pub course_id: String,

    /// Token for dismissing the notification server-side
    pub dismiss_id: String,

    /// Absolute URL of the referenced resource; empty when the event has none
    pub url: String,

    /// Diagnostic for unknown event/content codes; `None` otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_event_tag() {
        let alert = Alert {
            event: AlertEvent::AssignmentAvailable {
                assignment: "HW3".to_string(),
            },
            title: "HW3".to_string(),
            course_id: "_1_1".to_string(),
            dismiss_id: "d1".to_string(),
            url: String::new(),
            exception: None,
        };

        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["event"], "assignment:available");
        assert_eq!(value["assignment"], "HW3");
        assert!(value.get("exception").is_none());
    }

    #[test]
    fn serializes_content_tag() {
        let event = AlertEvent::ContentAvailable {
            content: ContentKind::File {
                file_url: "/bbcswebdav/f.pdf".to_string(),
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "content:available");
        assert_eq!(value["content"]["content_type"], "file");
    }
}
