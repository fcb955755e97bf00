// src/services/classify.rs

//! Raw-entry classification.
//!
//! `classify` is a pure, total function: every entry maps to exactly one
//! alert and no input makes it return an error. Unrecognized event or
//! content codes degrade to the `Unknown` variants with a diagnostic in
//! `Alert::exception`, so one odd entry never poisons a batch. Adding a
//! new server code is a single match arm.

use crate::models::{Alert, AlertEvent, ContentKind, RawEntry};
use crate::utils::html::{select_text, select_unwrapped_text};

/// Classify a batch of entries, preserving order.
pub fn classify_all(entries: &[RawEntry], base_url: &str) -> Vec<Alert> {
    entries
        .iter()
        .map(|entry| classify(entry, base_url))
        .collect()
}

/// Map one raw entry to its normalized alert.
pub fn classify(entry: &RawEntry, base_url: &str) -> Alert {
    // Overdue alerts (and some others) carry no resource URI.
    let url = entry
        .item_uri
        .as_deref()
        .map(|uri| format!("{base_url}{uri}"))
        .unwrap_or_default();

    let (event, exception) = match entry.extra_attribs.event_type.as_deref() {
        Some("CO:CO_AVAIL") => {
            let (content, exception) = classify_content(entry);
            (AlertEvent::ContentAvailable { content }, exception)
        }
        Some("GB:OVERDUE") => (AlertEvent::GradeOverdue, None),
        Some("AN:AN_AVAIL") => (
            AlertEvent::AnnouncementAvailable {
                announcement: announcement_text(entry),
            },
            None,
        ),
        Some("GB:GB_GRA_UPDATED") => (AlertEvent::GradeManualUpdate, None),
        Some("CR:CR_AVAIL") => (AlertEvent::CourseAvailable, None),
        Some("AS:DUE") => (
            AlertEvent::AssignmentDueAvailable {
                assignment: event_title(entry),
            },
            None,
        ),
        Some("AS:AS_AVAIL") => (
            AlertEvent::AssignmentAvailable {
                assignment: event_title(entry),
            },
            None,
        ),
        Some("GB:GB_ATT_UPDATED") => (
            AlertEvent::GradeUpdate {
                grade: event_title(entry),
            },
            None,
        ),
        Some(code) => (
            AlertEvent::Unknown,
            Some(format!("Unhandled event type '{code}'")),
        ),
        None => (
            AlertEvent::Unknown,
            Some("Entry carries no event type".to_string()),
        ),
    };

    Alert {
        event,
        title: entry.item.title.clone(),
        course_id: entry.course_id.clone(),
        dismiss_id: entry.item.notification_details.actor_id.clone(),
        url,
        exception,
    }
}

/// Sub-classify a `content:available` entry by its content handler.
fn classify_content(entry: &RawEntry) -> (ContentKind, Option<String>) {
    let Some(details) = &entry.item.content_details else {
        return (
            ContentKind::Unknown,
            Some("Content entry carries no content details".to_string()),
        );
    };

    match details.content_handler.as_str() {
        "resource/x-bb-file" => match &details.file_data {
            Some(file_url) => (
                ContentKind::File {
                    file_url: file_url.clone(),
                },
                None,
            ),
            None => (
                ContentKind::Unknown,
                Some("File content without a file URL".to_string()),
            ),
        },
        "resource/x-bb-document" => match &entry.item_uri {
            Some(doc_url) => (
                ContentKind::Document {
                    doc_url: doc_url.clone(),
                },
                None,
            ),
            None => (
                ContentKind::Unknown,
                Some("Document content without an item URI".to_string()),
            ),
        },
        "resource/x-bb-blankpage" => (ContentKind::Blank, None),
        "resource/x-bb-mediasite" => (ContentKind::Media, None),
        "resource/x-bb-forumlink" => (ContentKind::ForumLink, None),
        "resource/x-bb-video" => (ContentKind::Video, None),
        "resource/x-bb-externallink" => (ContentKind::ExternalLink, None),
        handler => (
            ContentKind::Unknown,
            Some(format!("Unhandled content type '{handler}'")),
        ),
    }
}

/// Assignment/grade title from the `.eventTitle` span inside `se_context`,
/// with the markup's line wrapping removed. Missing context or selector
/// miss degrades to an empty title.
fn event_title(entry: &RawEntry) -> String {
    entry
        .context
        .as_deref()
        .and_then(|context| select_unwrapped_text(context, ".eventTitle"))
        .unwrap_or_default()
}

/// Announcement body from the `.vtbegenerated` block inside `se_details`,
/// converted to plain text. Only present when the portal supplied one.
fn announcement_text(entry: &RawEntry) -> Option<String> {
    entry
        .details
        .as_deref()
        .filter(|details| !details.is_empty())
        .and_then(|details| select_text(details, ".vtbegenerated"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const BASE: &str = "https://c.zju.edu.cn";

    fn entry(value: serde_json::Value) -> RawEntry {
        serde_json::from_value(value).unwrap()
    }

    fn base_entry(event_type: &str) -> serde_json::Value {
        json!({
            "se_id": "e1",
            "se_courseId": "_4069_1",
            "itemSpecificData": {
                "title": "Title",
                "notificationDetails": {"actorId": "actor-1"}
            },
            "extraAttribs": {"event_type": event_type}
        })
    }

    #[test]
    fn unknown_event_type_degrades_with_diagnostic() {
        let alert = classify(&entry(base_entry("XX:NEW_THING")), BASE);
        assert_eq!(alert.event, AlertEvent::Unknown);
        let exception = alert.exception.unwrap();
        assert!(!exception.is_empty());
        assert!(exception.contains("XX:NEW_THING"));
    }

    #[test]
    fn missing_event_type_degrades_with_diagnostic() {
        let mut value = base_entry("ignored");
        value["extraAttribs"] = json!({});
        let alert = classify(&entry(value), BASE);
        assert_eq!(alert.event, AlertEvent::Unknown);
        assert!(alert.exception.is_some());
    }

    #[test]
    fn course_available_preserves_unmapped_course_id() {
        let mut value = base_entry("CR:CR_AVAIL");
        value["se_courseId"] = json!("_9999_1");
        let alert = classify(&entry(value), BASE);
        assert_eq!(alert.event, AlertEvent::CourseAvailable);
        assert_eq!(alert.course_id, "_9999_1");
        assert!(alert.exception.is_none());
    }

    #[test]
    fn assignment_available_extracts_event_title() {
        let mut value = base_entry("AS:AS_AVAIL");
        value["se_context"] = json!("<div><span class=\"eventTitle\">HW3</span></div>");
        let alert = classify(&entry(value), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::AssignmentAvailable {
                assignment: "HW3".to_string()
            }
        );
    }

    #[test]
    fn assignment_title_strips_embedded_newlines() {
        let mut value = base_entry("AS:DUE");
        value["se_context"] = json!("<span class=\"eventTitle\">HW\n4</span>");
        let alert = classify(&entry(value), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::AssignmentDueAvailable {
                assignment: "HW4".to_string()
            }
        );
    }

    #[test]
    fn assignment_without_context_gets_empty_title() {
        let alert = classify(&entry(base_entry("AS:AS_AVAIL")), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::AssignmentAvailable {
                assignment: String::new()
            }
        );
    }

    #[test]
    fn grade_update_extracts_title() {
        let mut value = base_entry("GB:GB_ATT_UPDATED");
        value["se_context"] = json!("<span class=\"eventTitle\">Quiz 2</span>");
        let alert = classify(&entry(value), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::GradeUpdate {
                grade: "Quiz 2".to_string()
            }
        );
    }

    #[test]
    fn announcement_converts_body_to_plain_text() {
        let mut value = base_entry("AN:AN_AVAIL");
        value["se_details"] =
            json!("<div class=\"vtbegenerated\"><p>Class <b>moved</b> to Tuesday</p></div>");
        let alert = classify(&entry(value), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::AnnouncementAvailable {
                announcement: Some("Class moved to Tuesday".to_string())
            }
        );
    }

    #[test]
    fn announcement_without_details_has_no_body() {
        let alert = classify(&entry(base_entry("AN:AN_AVAIL")), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::AnnouncementAvailable { announcement: None }
        );
    }

    #[test]
    fn overdue_alert_has_empty_url() {
        let alert = classify(&entry(base_entry("GB:OVERDUE")), BASE);
        assert_eq!(alert.event, AlertEvent::GradeOverdue);
        assert_eq!(alert.url, "");
    }

    #[test]
    fn url_joins_base_and_item_uri() {
        let mut value = base_entry("GB:GB_GRA_UPDATED");
        value["se_itemUri"] = json!("/webapps/gradebook/item/42");
        let alert = classify(&entry(value), BASE);
        assert_eq!(alert.url, "https://c.zju.edu.cn/webapps/gradebook/item/42");
    }

    fn content_entry(handler: &str) -> serde_json::Value {
        let mut value = base_entry("CO:CO_AVAIL");
        value["se_itemUri"] = json!("/webapps/content/item/7");
        value["itemSpecificData"]["contentDetails"] = json!({"contentHandler": handler});
        value
    }

    #[test]
    fn content_file_carries_file_url() {
        let mut value = content_entry("resource/x-bb-file");
        value["itemSpecificData"]["contentDetails"]["contentSpecificFileData"] =
            json!("/bbcswebdav/courses/hw1.pdf");
        let alert = classify(&entry(value), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::ContentAvailable {
                content: ContentKind::File {
                    file_url: "/bbcswebdav/courses/hw1.pdf".to_string()
                }
            }
        );
    }

    #[test]
    fn content_file_without_url_degrades() {
        let alert = classify(&entry(content_entry("resource/x-bb-file")), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::ContentAvailable {
                content: ContentKind::Unknown
            }
        );
        assert!(alert.exception.is_some());
    }

    #[test]
    fn content_document_carries_doc_url() {
        let alert = classify(&entry(content_entry("resource/x-bb-document")), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::ContentAvailable {
                content: ContentKind::Document {
                    doc_url: "/webapps/content/item/7".to_string()
                }
            }
        );
    }

    #[test]
    fn content_unit_kinds_map_by_handler() {
        let cases = [
            ("resource/x-bb-blankpage", ContentKind::Blank),
            ("resource/x-bb-mediasite", ContentKind::Media),
            ("resource/x-bb-forumlink", ContentKind::ForumLink),
            ("resource/x-bb-video", ContentKind::Video),
            ("resource/x-bb-externallink", ContentKind::ExternalLink),
        ];
        for (handler, expected) in cases {
            let alert = classify(&entry(content_entry(handler)), BASE);
            assert_eq!(
                alert.event,
                AlertEvent::ContentAvailable { content: expected },
                "handler {handler}"
            );
            assert!(alert.exception.is_none());
        }
    }

    #[test]
    fn unknown_content_handler_degrades_with_diagnostic() {
        let alert = classify(&entry(content_entry("resource/x-bb-toollink")), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::ContentAvailable {
                content: ContentKind::Unknown
            }
        );
        assert!(alert.exception.unwrap().contains("resource/x-bb-toollink"));
    }

    #[test]
    fn content_without_details_degrades() {
        let alert = classify(&entry(base_entry("CO:CO_AVAIL")), BASE);
        assert_eq!(
            alert.event,
            AlertEvent::ContentAvailable {
                content: ContentKind::Unknown
            }
        );
        assert!(alert.exception.is_some());
    }

    #[test]
    fn replay_yields_identical_alert_sequences() {
        let entries: Vec<RawEntry> = [
            base_entry("CR:CR_AVAIL"),
            content_entry("resource/x-bb-document"),
            base_entry("XX:MYSTERY"),
        ]
        .into_iter()
        .map(entry)
        .collect();

        let first = serde_json::to_string(&classify_all(&entries, BASE)).unwrap();
        let second = serde_json::to_string(&classify_all(&entries, BASE)).unwrap();
        assert_eq!(first, second);
    }
}
