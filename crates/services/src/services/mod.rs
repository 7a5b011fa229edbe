pub mod assignment;
pub mod config;
pub mod notification;
pub mod visit_confirmation;
