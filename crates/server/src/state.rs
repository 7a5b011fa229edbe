use db::DBService;
use services::services::{config::Config, notification::NotificationService};

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    config: Config,
    notifications: NotificationService,
}

impl AppState {
    pub fn new(db: DBService, config: Config, notifications: NotificationService) -> Self {
        Self {
            db,
            config,
            notifications,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }
}
