//! Service layer for the alert poller.
//!
//! This module contains the business logic for:
//! - Portal HTTP session (`Session`)
//! - Stream pagination and dedup (`StreamFetcher`)
//! - Raw-entry classification (`classify`)
//! - Document/assignment page interpretation (`interpret`)
//! - Task delivery (`TaskSink`)

mod classify;
mod interpret;
mod session;
mod sink;
mod stream;

pub use classify::{classify, classify_all};
pub use interpret::{
    InterpretedAssignment, InterpretedDocument, interpret_assignment_page, interpret_document,
    parse_assignment_page, parse_document_page,
};
pub use session::{DownloadOutcome, Session};
pub use sink::{JsonlSink, TaskSink};
pub use stream::{StreamFetcher, StreamSource};
