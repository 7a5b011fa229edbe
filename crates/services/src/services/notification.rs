//! Persists in-app notifications for collectors.

use db::{
    DBService,
    models::{
        notification::{CreateNotification, Notification, NotificationType},
        site_visit::SiteVisit,
    },
};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    db: DBService,
}

impl NotificationService {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }

    pub async fn push(&self, data: CreateNotification) -> Result<Notification, sqlx::Error> {
        let notification = Notification::create(&self.db.pool, &data).await?;
        info!(
            user_id = %notification.user_id,
            title = %notification.title,
            "notification stored"
        );
        Ok(notification)
    }

    /// Assignment message with the payment-schedule breakdown the finance
    /// workflow expects: `upfront_share` cleared before start, the rest on
    /// completion.
    pub async fn notify_assignment(
        &self,
        visit: &SiteVisit,
        collector_id: Uuid,
        upfront_share: f64,
    ) -> Result<Notification, sqlx::Error> {
        let total = visit.fee_total;
        let upfront = total * upfront_share;
        let remainder = total - upfront;
        let message = format!(
            "You have been assigned to the site visit at {}. Total fee: {} {}. \
             Payment schedule: {:.0}% ({:.2}) upfront cleared before start, \
             {:.0}% ({:.2}) after completion.",
            visit.site_name,
            total,
            visit.fee_currency,
            upfront_share * 100.0,
            upfront,
            (1.0 - upfront_share) * 100.0,
            remainder,
        );

        self.push(CreateNotification {
            user_id: collector_id,
            title: "Assigned to Site Visit".to_string(),
            message,
            notification_type: NotificationType::Info,
            link: Some(format!("/site-visits/{}", visit.id)),
            related_entity_id: Some(visit.id),
            related_entity_type: Some("site_visit".to_string()),
        })
        .await
    }

    /// Tells a collector their assignment lapsed unconfirmed.
    pub async fn notify_assignment_expired(
        &self,
        visit: &SiteVisit,
        collector_id: Uuid,
    ) -> Result<Notification, sqlx::Error> {
        self.push(CreateNotification {
            user_id: collector_id,
            title: "Assignment Expired".to_string(),
            message: format!(
                "Your assignment to the site visit at {} was not confirmed in time \
                 and has been released for reassignment.",
                visit.site_name
            ),
            notification_type: NotificationType::Warning,
            link: Some(format!("/site-visits/{}", visit.id)),
            related_entity_id: Some(visit.id),
            related_entity_type: Some("site_visit".to_string()),
        })
        .await
    }
}
