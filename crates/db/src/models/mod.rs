pub mod assignment_log;
pub mod collector;
pub mod notification;
pub mod site_visit;
