pub mod activity_service;
pub mod cascade;
pub mod mailer;
pub mod user_service;

pub use activity_service::ActivityService;
pub use mailer::{Email, LogMailer, MailError, Mailer, RecordingMailer};
