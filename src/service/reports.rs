use chrono::Utc;

use crate::db::models::{NewReport, Report};
use crate::error::RoastrResult;
use crate::notify::{messages, Notice};
use crate::service::{Roastr, ViewerContext};

/// Marker stored for reports from anonymous visitors. Time-based only: it
/// does not identify the visitor and cannot deduplicate their reports.
fn anonymous_marker() -> String {
    format!("anonymous_{}", Utc::now().timestamp_millis())
}

impl Roastr {
    /// Flag a post for moderation. Works for anonymous visitors too and
    /// leaves the feed untouched.
    pub async fn report_post(&self, ctx: &ViewerContext, post_id: &str) -> RoastrResult<Report> {
        let report = match ctx.viewer() {
            Some(viewer) => NewReport {
                post_id: post_id.to_string(),
                user_id: Some(viewer.id.clone()),
                anonymous_marker: None,
            },
            None => NewReport {
                post_id: post_id.to_string(),
                user_id: None,
                anonymous_marker: Some(anonymous_marker()),
            },
        };

        match self.backend().insert_report(&report).await {
            Ok(report) => {
                tracing::info!(post_id, report_id = %report.id, "Post reported");
                ctx.notify(Notice::success(messages::REPORTED));
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Error reporting post: {}", e);
                ctx.notify(Notice::error(messages::REPORT_FAILED));
                Err(e.into())
            }
        }
    }
}
