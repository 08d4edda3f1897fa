// Business logic services

pub mod booking_service;
pub mod content_service;
pub mod email_service;

pub use booking_service::{BookingError, BookingService};
pub use content_service::{ContentError, ContentService};
pub use email_service::{
    mailer_from_config, EmailError, EmailMessage, EmailService, LogMailer, Mailer, SmtpConfig, SmtpMailer,
};

#[cfg(test)]
pub use email_service::MockMailer;
