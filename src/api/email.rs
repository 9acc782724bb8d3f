//! Email delivery abstraction.
//!
//! Registration and password recovery hand messages to an [`EmailSender`].
//! The sender decides how to deliver (SMTP, API, etc.) and returns
//! `Ok`/`Err`. Delivery is best effort: callers log failures through
//! [`dispatch`] and the originating request still succeeds, since the code or
//! password can reach the user again through another channel.
//!
//! The default sender for local dev is `LogEmailSender`, which logs and
//! returns `Ok(())`.

use anyhow::Result;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to have it logged as failed.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }
}

/// Send a message, logging a warning on failure instead of propagating it.
pub fn dispatch(sender: &dyn EmailSender, message: &EmailMessage) {
    if let Err(err) = sender.send(message) {
        warn!(to_email = %message.to_email, "Failed to send email: {err}");
    }
}
