//! Serde models for the portal's raw stream payloads.
//!
//! Field names follow the portal's JSON keys (`se_*`, camelCase nested
//! objects). Unmodeled keys are kept in flattened maps so archived entries
//! round-trip byte-for-byte through serde_json.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One opaque notification record from the alert stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Stable unique identifier, used for deduplication
    #[serde(rename = "se_id")]
    pub id: String,

    /// Course the notification belongs to
    #[serde(rename = "se_courseId", default)]
    pub course_id: String,

    /// Relative URI of the referenced resource (overdue alerts have none)
    #[serde(rename = "se_itemUri", default, skip_serializing_if = "Option::is_none")]
    pub item_uri: Option<String>,

    /// HTML fragment with announcement details
    #[serde(rename = "se_details", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// HTML fragment with event context (assignment/grade titles)
    #[serde(rename = "se_context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Event-specific nested payload
    #[serde(rename = "itemSpecificData", default)]
    pub item: ItemSpecificData,

    /// Server-defined event attributes
    #[serde(rename = "extraAttribs", default)]
    pub extra_attribs: ExtraAttribs,

    /// Unmodeled portal fields, preserved for archival
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested `itemSpecificData` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSpecificData {
    #[serde(default)]
    pub title: String,

    #[serde(rename = "notificationDetails", default)]
    pub notification_details: NotificationDetails,

    #[serde(
        rename = "contentDetails",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_details: Option<ContentDetails>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested `notificationDetails` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationDetails {
    /// Token used to acknowledge/remove the notification server-side
    #[serde(rename = "actorId", default)]
    pub actor_id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested `contentDetails` object, present on content alerts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDetails {
    /// Server content-handler string, e.g. `resource/x-bb-file`
    #[serde(rename = "contentHandler", default)]
    pub content_handler: String,

    /// Relative download URL for file content
    #[serde(
        rename = "contentSpecificFileData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_data: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested `extraAttribs` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraAttribs {
    /// Server-defined event code, e.g. `CO:CO_AVAIL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the paginated stream response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamPage {
    /// Entries delivered in this page
    #[serde(rename = "sv_streamEntries", default)]
    pub entries: Vec<RawEntry>,

    /// Server flag indicating further pages are available
    #[serde(rename = "sv_moreData", default)]
    pub more_data: bool,
}
