//! Storage backends for the alert poller.

mod archive;

pub use archive::EntryArchive;
