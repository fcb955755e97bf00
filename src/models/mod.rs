// src/models/mod.rs

//! Domain models for the alert poller.
//!
//! Raw portal payloads (`entry`), the normalized alert model (`alert`),
//! and the TOML configuration tree (`config`).

mod alert;
mod config;
mod entry;

pub use alert::{Alert, AlertEvent, ContentKind};
pub use config::{
    ArchiveConfig, Config, CourseMapping, DismissConfig, DownloadConfig, FetchConfig, LoginConfig,
    LoginCredentials, PortalConfig, SinkConfig,
};
pub use entry::{ContentDetails, ExtraAttribs, ItemSpecificData, NotificationDetails, RawEntry, StreamPage};
