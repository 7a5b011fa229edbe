//! Auto-assignment of newly created site visits to field data collectors.
//!
//! The selection itself lives in the `dispatch` crate; this service gathers
//! its inputs (role-filtered collector pool, workload counts), persists the
//! decision behind a compare-and-swap, and handles notification and audit
//! logging.

use std::time::Duration;

use db::{
    DBService,
    models::{
        assignment_log::{AssignmentAction, AssignmentLog},
        collector::CollectorProfile,
        site_visit::{SiteVisit, VisitStatus},
    },
};
use dispatch::{Candidate, MatchTier, resolve_assignment};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{config::Config, notification::NotificationService};

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("site visit not found")]
    VisitNotFound,
    #[error("site visit is not pending")]
    NotPending,
    #[error("collector not found")]
    CollectorNotFound,
}

/// What one assignment attempt did, for the API and the audit log.
#[derive(Debug, Clone, Serialize, TS)]
pub struct AssignmentOutcome {
    pub action: AssignmentAction,
    pub collector_id: Option<Uuid>,
    pub tier: Option<MatchTier>,
    pub reasoning: Option<String>,
}

/// Background service that retries assignment for pending visits, plus the
/// entry points the creation flow and manual-assignment route call directly.
pub struct AssignmentService {
    db: DBService,
    notification_service: NotificationService,
    poll_interval: Duration,
    upfront_share: f64,
}

impl AssignmentService {
    pub async fn spawn(
        db: DBService,
        notification_service: NotificationService,
        config: &Config,
    ) -> tokio::task::JoinHandle<()> {
        let service = Self {
            db,
            notification_service,
            poll_interval: Duration::from_secs(config.sweep_interval_secs),
            upfront_share: config.upfront_share,
        };
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting assignment service with interval {:?}",
            self.poll_interval
        );

        let mut interval = interval(self.poll_interval);

        loop {
            interval.tick().await;
            if let Err(e) = self.sweep_pending().await {
                error!("Error sweeping pending site visits: {}", e);
            }
        }
    }

    /// Re-attempt assignment for visits still pending, e.g. because no
    /// collector was available when they were created.
    async fn sweep_pending(&self) -> Result<(), AssignmentError> {
        let pending = SiteVisit::find_unassigned_pending(&self.db.pool).await?;

        if pending.is_empty() {
            debug!("Assignment sweep: no unassigned pending visits");
            return Ok(());
        }

        for visit in pending {
            match Self::auto_assign(
                &self.db.pool,
                &self.notification_service,
                visit.id,
                None,
                self.upfront_share,
            )
            .await
            {
                Ok(outcome) if outcome.action == AssignmentAction::Assigned => {
                    info!(
                        visit_id = %visit.id,
                        collector_id = ?outcome.collector_id,
                        tier = ?outcome.tier,
                        "Assignment sweep: visit assigned"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        visit_id = %visit.id,
                        error = %e,
                        "Assignment sweep: attempt failed"
                    );
                }
            }
        }

        Ok(())
    }

    /// Resolve and persist an assignment for a pending visit.
    ///
    /// Finding nobody is a normal outcome (the visit stays pending for
    /// manual assignment), surfaced as a `Skipped` outcome rather than an
    /// error. Losing the compare-and-swap to a concurrent request is
    /// likewise `Skipped`.
    pub async fn auto_assign(
        pool: &SqlitePool,
        notification_service: &NotificationService,
        visit_id: Uuid,
        assigned_by: Option<Uuid>,
        upfront_share: f64,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let visit = SiteVisit::find_by_id(pool, visit_id)
            .await?
            .ok_or(AssignmentError::VisitNotFound)?;
        if visit.status != VisitStatus::Pending {
            return Err(AssignmentError::NotPending);
        }

        let collectors = CollectorProfile::find_data_collectors(pool).await?;
        let candidates: Vec<Candidate> =
            collectors.iter().map(CollectorProfile::to_candidate).collect();
        let workloads = SiteVisit::active_counts_by_assignee(pool).await?;

        let decision = resolve_assignment(&visit.target(), &candidates, |id| {
            workloads.get(&id).copied().unwrap_or(0)
        });

        let Some(collector_id) = decision.assigned_to else {
            let reasoning = "no eligible collectors in the pool".to_string();
            AssignmentLog::create(
                pool,
                visit_id,
                None,
                AssignmentAction::Skipped,
                None,
                Some(reasoning.clone()),
            )
            .await?;
            info!(visit_id = %visit_id, "Auto-assignment: pool empty, visit stays pending");
            return Ok(AssignmentOutcome {
                action: AssignmentAction::Skipped,
                collector_id: None,
                tier: None,
                reasoning: Some(reasoning),
            });
        };

        if !SiteVisit::try_assign(pool, visit_id, collector_id, assigned_by).await? {
            let reasoning = "visit was claimed by a concurrent request".to_string();
            AssignmentLog::create(
                pool,
                visit_id,
                Some(collector_id),
                AssignmentAction::Skipped,
                decision.tier.map(|t| t.to_string()),
                Some(reasoning.clone()),
            )
            .await?;
            warn!(visit_id = %visit_id, "Auto-assignment: lost compare-and-swap");
            return Ok(AssignmentOutcome {
                action: AssignmentAction::Skipped,
                collector_id: None,
                tier: decision.tier,
                reasoning: Some(reasoning),
            });
        }

        notification_service
            .notify_assignment(&visit, collector_id, upfront_share)
            .await?;

        let reasoning = match (decision.tier, decision.workload, decision.distance_km) {
            (Some(tier), Some(workload), Some(distance)) => {
                format!("tier {tier}, workload {workload}, distance {distance:.1} km")
            }
            (Some(tier), Some(workload), None) => {
                format!("tier {tier}, workload {workload}, distance unknown")
            }
            _ => "selected from candidate pool".to_string(),
        };
        AssignmentLog::create(
            pool,
            visit_id,
            Some(collector_id),
            AssignmentAction::Assigned,
            decision.tier.map(|t| t.to_string()),
            Some(reasoning.clone()),
        )
        .await?;

        info!(
            visit_id = %visit_id,
            collector_id = %collector_id,
            tier = ?decision.tier,
            "Auto-assignment: visit assigned"
        );

        Ok(AssignmentOutcome {
            action: AssignmentAction::Assigned,
            collector_id: Some(collector_id),
            tier: decision.tier,
            reasoning: Some(reasoning),
        })
    }

    /// Coordinator-driven assignment of a specific collector. Uses the same
    /// compare-and-swap and notification path as auto-assignment.
    pub async fn assign_manual(
        pool: &SqlitePool,
        notification_service: &NotificationService,
        visit_id: Uuid,
        collector_id: Uuid,
        assigned_by: Option<Uuid>,
        upfront_share: f64,
    ) -> Result<AssignmentOutcome, AssignmentError> {
        let visit = SiteVisit::find_by_id(pool, visit_id)
            .await?
            .ok_or(AssignmentError::VisitNotFound)?;
        CollectorProfile::find_by_id(pool, collector_id)
            .await?
            .ok_or(AssignmentError::CollectorNotFound)?;

        if !SiteVisit::try_assign(pool, visit_id, collector_id, assigned_by).await? {
            return Err(AssignmentError::NotPending);
        }

        notification_service
            .notify_assignment(&visit, collector_id, upfront_share)
            .await?;

        let reasoning = "manual assignment".to_string();
        AssignmentLog::create(
            pool,
            visit_id,
            Some(collector_id),
            AssignmentAction::Assigned,
            None,
            Some(reasoning.clone()),
        )
        .await?;

        info!(
            visit_id = %visit_id,
            collector_id = %collector_id,
            "Manual assignment: visit assigned"
        );

        Ok(AssignmentOutcome {
            action: AssignmentAction::Assigned,
            collector_id: Some(collector_id),
            tier: None,
            reasoning: Some(reasoning),
        })
    }
}
