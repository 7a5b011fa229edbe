//! Releases assignments that were never confirmed by the collector.

use std::time::Duration;

use db::{
    DBService,
    models::{
        assignment_log::{AssignmentAction, AssignmentLog},
        site_visit::SiteVisit,
    },
};
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use super::{config::Config, notification::NotificationService};

#[derive(Debug, Error)]
pub enum VisitConfirmationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Background service reverting visits stuck in `assigned` past the
/// confirmation deadline, so the sweep can offer them to someone else.
pub struct VisitConfirmationService {
    db: DBService,
    notification_service: NotificationService,
    poll_interval: Duration,
    timeout_minutes: i64,
}

impl VisitConfirmationService {
    pub async fn spawn(
        db: DBService,
        notification_service: NotificationService,
        config: &Config,
    ) -> tokio::task::JoinHandle<()> {
        let service = Self {
            db,
            notification_service,
            poll_interval: Duration::from_secs(config.sweep_interval_secs),
            timeout_minutes: config.confirmation_timeout_minutes,
        };
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting visit confirmation service with interval {:?}, timeout: {} min",
            self.poll_interval, self.timeout_minutes
        );

        let mut interval = interval(self.poll_interval);

        loop {
            interval.tick().await;
            if let Err(e) = self.check_for_expired_assignments().await {
                error!("Error checking for expired assignments: {}", e);
            }
        }
    }

    async fn check_for_expired_assignments(&self) -> Result<(), VisitConfirmationError> {
        let stalled = SiteVisit::find_stalled_assigned(&self.db.pool, self.timeout_minutes).await?;

        if stalled.is_empty() {
            debug!("Visit confirmation: no expired assignments");
            return Ok(());
        }

        for visit in stalled {
            let Some(collector_id) = visit.assigned_to else {
                continue;
            };

            if !SiteVisit::unassign(&self.db.pool, visit.id).await? {
                // Status moved on (confirmed or cancelled) between the scan
                // and the revert.
                continue;
            }

            info!(
                visit_id = %visit.id,
                collector_id = %collector_id,
                "Visit confirmation: assignment expired, visit reverted to pending"
            );

            AssignmentLog::create(
                &self.db.pool,
                visit.id,
                Some(collector_id),
                AssignmentAction::Reverted,
                None,
                Some(format!(
                    "assignment not confirmed within {} minutes",
                    self.timeout_minutes
                )),
            )
            .await?;

            if let Err(e) = self
                .notification_service
                .notify_assignment_expired(&visit, collector_id)
                .await
            {
                warn!(
                    visit_id = %visit.id,
                    error = %e,
                    "Visit confirmation: failed to store expiry notification"
                );
            }
        }

        Ok(())
    }
}
