// src/pipeline/dispatch.rs

//! Alert dispatch: turn classified alerts into side effects.
//!
//! Each alert becomes one task item in the sink; content alerts may
//! additionally trigger downloads and follow-up page interpretation, and
//! handled alerts are dismissed on the portal. Side-effect failures are
//! reported per alert and never stop the remaining alerts.
//!
//! The event match below is exhaustive over the classifier's closed
//! variant set; a new variant fails compilation here until this consumer
//! handles it.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;
use crate::models::{Alert, AlertEvent, Config, ContentKind};
use crate::services::{
    DownloadOutcome, Session, TaskSink, interpret_assignment_page, interpret_document,
};

/// Summary of one dispatch pass.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Task items delivered to the sink
    pub delivered: usize,

    /// Alerts whose delivery failed
    pub failures: usize,

    /// True when unmapped course IDs diverted the pass to the
    /// new-course path
    pub new_courses: bool,
}

/// Consumes alerts and produces side effects.
pub struct Dispatcher<'a> {
    session: &'a Session,
    config: &'a Config,
    sink: &'a dyn TaskSink,
}

impl<'a> Dispatcher<'a> {
    pub fn new(session: &'a Session, config: &'a Config, sink: &'a dyn TaskSink) -> Self {
        Self {
            session,
            config,
            sink,
        }
    }

    /// Dispatch a full pass of alerts.
    ///
    /// If any alert references a course with no configured name, the pass
    /// switches to the new-course path: only course-available alerts are
    /// delivered (and dismissed), everything else is left on the portal
    /// for the next run after the mapping is updated.
    pub async fn dispatch_all(&self, alerts: &[Alert]) -> Result<DispatchOutcome> {
        let mut outcome = DispatchOutcome::default();

        let unknown_courses: BTreeSet<&str> = alerts
            .iter()
            .filter(|alert| self.config.course_name(&alert.course_id).is_none())
            .map(|alert| alert.course_id.as_str())
            .collect();

        if !unknown_courses.is_empty() {
            log::warn!(
                "New course(s) detected ({}). Handle them first.",
                unknown_courses.into_iter().collect::<Vec<_>>().join(", ")
            );
            outcome.new_courses = true;

            for alert in alerts {
                if alert.event != AlertEvent::CourseAvailable {
                    continue;
                }
                let title = format!("Course {} available", alert.title);
                let note = format!("Course ID: {}\n", alert.course_id);
                match self.sink.add_item(&title, &note).await {
                    Ok(()) => outcome.delivered += 1,
                    Err(error) => {
                        outcome.failures += 1;
                        log::error!("Failed to deliver course alert: {}", error);
                    }
                }
                if self.config.dismiss.enabled {
                    self.session.dismiss(&alert.dismiss_id).await;
                }
            }
            return Ok(outcome);
        }

        log::info!("Ready to handle {} alert(s)", alerts.len());
        for alert in alerts {
            match self.handle_alert(alert).await {
                Ok(()) => outcome.delivered += 1,
                Err(error) => {
                    outcome.failures += 1;
                    log::error!("Failed to handle alert '{}': {}", alert.title, error);
                }
            }
        }
        Ok(outcome)
    }

    /// Handle one alert end to end.
    async fn handle_alert(&self, alert: &Alert) -> Result<()> {
        let course_name = self.config.course_name(&alert.course_id).unwrap_or("");
        log::info!("{}{}", course_name, alert.title);

        let mut title = course_name.to_string();
        let mut note = String::new();
        // Interpretation failures keep the alert on the portal for a retry.
        let mut should_dismiss = true;

        match &alert.event {
            AlertEvent::ContentAvailable { content } => {
                title.push_str(&format!("content {} available", alert.title));
                match content {
                    ContentKind::File { file_url } => {
                        if self.config.download.enabled {
                            self.download_with_note(file_url, &mut note).await;
                        }
                    }
                    ContentKind::Document { doc_url } => {
                        note.push_str("TYPE: document.\n");
                        log::info!("  Further look into document");
                        match interpret_document(self.session, doc_url).await {
                            None => {
                                log::error!("  Failed to interpret document {}", doc_url);
                                self.report_exception(&format!(
                                    "Failed to interpret document {doc_url}"
                                ))
                                .await;
                                note.push_str("FAIL TO INTERPRET!\n");
                                should_dismiss = false;
                            }
                            Some(doc) => {
                                if !doc.exception.is_empty() {
                                    log::warn!(
                                        "  Document parser notes: {}",
                                        doc.exception.trim_end()
                                    );
                                }
                                note.push_str(&doc.text);
                                if self.config.download.enabled {
                                    for attachment in &doc.attachments {
                                        self.download_with_note(attachment, &mut note).await;
                                    }
                                }
                            }
                        }
                    }
                    ContentKind::Blank => {
                        note.push_str("TYPE: blank page. See original URL.\n");
                    }
                    ContentKind::Media => {
                        note.push_str("TYPE: media page. See original URL.\n");
                    }
                    ContentKind::ForumLink => {
                        note.push_str("TYPE: forum link. See original URL.\n");
                    }
                    ContentKind::Video => {
                        note.push_str("TYPE: video. See original URL.\n");
                    }
                    ContentKind::ExternalLink => {
                        note.push_str("TYPE: external link. See original URL.\n");
                    }
                    ContentKind::Unknown => {
                        title.push_str(" [unknown type]");
                        note.push_str(&format!("EXCEPTION: {}\n", self.exception_text(alert)));
                        log::error!(
                            "  Exception from classifier: {}",
                            self.exception_text(alert)
                        );
                    }
                }
            }
            AlertEvent::GradeOverdue => {
                title.push_str(&format!("{} overdue", alert.title));
            }
            AlertEvent::AnnouncementAvailable { announcement } => {
                title.push_str(&format!("announcement {}", alert.title));
                if let Some(body) = announcement {
                    note.push_str(body);
                    note.push('\n');
                }
            }
            AlertEvent::GradeManualUpdate => {
                title.push_str(&format!("manual score of {} updated", alert.title));
            }
            AlertEvent::AssignmentDueAvailable { assignment } => {
                title.push_str(&format!("assignment {} due time available", assignment));
            }
            AlertEvent::AssignmentAvailable { assignment } => {
                title.push_str(&format!("assignment {} available", assignment));
                match interpret_assignment_page(self.session, &alert.url).await {
                    None => {
                        log::error!("  Failed to interpret assignment page {}", alert.url);
                        self.report_exception(&format!(
                            "Failed to interpret assignment page {}",
                            alert.url
                        ))
                        .await;
                        note.push_str("FAIL TO INTERPRET!\n");
                        should_dismiss = false;
                    }
                    Some(page) => {
                        note.push_str(&page.content);
                        if self.config.download.enabled {
                            for attachment in &page.attachments {
                                self.download_with_note(attachment, &mut note).await;
                            }
                        }
                    }
                }
            }
            AlertEvent::GradeUpdate { grade } => {
                title.push_str(&format!("grade of {} updated", grade));
            }
            AlertEvent::CourseAvailable => {
                title.push_str(&format!("course {} available", alert.title));
                note.push_str(&format!("Course ID: {}\n", alert.course_id));
            }
            AlertEvent::Unknown => {
                title.push_str(&format!(" [unknown event] {}", alert.title));
                note.push_str(&format!("EXCEPTION: {}\n", self.exception_text(alert)));
                log::error!(
                    "  Exception from classifier: {}",
                    self.exception_text(alert)
                );
            }
        }

        if self.config.dismiss.enabled && should_dismiss {
            if self.session.dismiss(&alert.dismiss_id).await {
                log::info!("  {} dismissed", alert.title);
            } else {
                log::error!("  Failed to dismiss {}", alert.title);
            }
        } else {
            note.push_str("Alert is NOT dismissed.\n");
        }

        if !alert.url.is_empty() {
            note.push('\n');
            note.push_str(&alert.url);
        }

        self.sink.add_item(&title, &note).await
    }

    /// Download one attachment and append the outcome to the note.
    async fn download_with_note(&self, path: &str, note: &mut String) {
        let target = Path::new(&self.config.download.dir);
        let cap = self.config.download.max_size();

        match self.session.download_file(path, target, cap).await {
            Ok(DownloadOutcome::Saved { filename, .. }) => {
                log::info!("  {} downloaded", filename);
                note.push_str(&format!("[INFO] {filename} downloaded\n"));
            }
            Ok(DownloadOutcome::TooLarge { filename, size }) => {
                let mb = size / 1024 / 1024;
                log::info!("  {} is not downloaded due to large size ({} MB)", filename, mb);
                note.push_str(&format!(
                    "[INFO] {filename} is not downloaded due to large size ({mb} MB)\n"
                ));
            }
            Err(error) => {
                log::error!("  Download of {} failed: {}", path, error);
                note.push_str(&format!("[INFO] download of {path} failed\n"));
            }
        }
    }

    /// Report a dispatch-level exception as its own task item.
    async fn report_exception(&self, info: &str) {
        if let Err(error) = self
            .sink
            .add_item("Handle exception in alert dispatch", info)
            .await
        {
            log::error!("Failed to report exception task: {}", error);
        }
    }

    fn exception_text<'b>(&self, alert: &'b Alert) -> &'b str {
        alert.exception.as_deref().unwrap_or("unspecified")
    }
}
