/// Outbound notifications
///
/// The password reset flow hands the plaintext reset token to a [`Mailer`].
/// Two implementations are provided:
///
/// - [`LogMailer`]: writes the message to the tracing log; the default when no
///   mail relay is configured
/// - [`HttpMailer`]: POSTs the message as JSON to an HTTP mail relay
///
/// # Example
///
/// ```no_run
/// use freelacrm_shared::notify::{HttpMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = HttpMailer::new(
///     "https://mail.internal/send",
///     "no-reply@freelacrm.app",
///     "https://app.freelacrm.app/auth/reset-password",
/// );
/// mailer.send_password_reset("ada@example.com", "0123abcd...").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

/// Error type for notification delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Could not reach the relay
    #[error("Mail transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Relay answered with a non-success status
    #[error("Mail relay rejected message with status {0}")]
    Rejected(u16),
}

/// Delivers notifications to users
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the password reset token to `to`
    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), MailError>;
}

/// A rendered email
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl MailMessage {
    /// Renders the password reset email with a link to `reset_url_base`
    pub fn password_reset(from: &str, to: &str, token: &str, reset_url_base: &str) -> Self {
        let link = format!("{}?token={}", reset_url_base.trim_end_matches('?'), token);

        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: "Reset your FreelaCRM password".to_string(),
            text: format!(
                "We received a request to reset your password.\n\n\
                 Open the link below to choose a new one:\n{link}\n\n\
                 The link is valid for 1 hour. If you did not ask for a reset, \
                 you can ignore this message."
            ),
        }
    }
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
    reset_url_base: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>, reset_url_base: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            reset_url_base: reset_url_base.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), MailError> {
        let message = MailMessage::password_reset(&self.from, to, token, &self.reset_url_base);
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "Mail relay not configured, logging password reset message"
        );
        Ok(())
    }
}

/// Sends messages through an HTTP mail relay
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    from: String,
    reset_url_base: String,
}

impl HttpMailer {
    pub fn new(
        endpoint: impl Into<String>,
        from: impl Into<String>,
        reset_url_base: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            from: from.into(),
            reset_url_base: reset_url_base.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), MailError> {
        let message = MailMessage::password_reset(&self.from, to, token, &self.reset_url_base);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), to = %to, "Mail relay rejected password reset message");
            return Err(MailError::Rejected(status.as_u16()));
        }

        info!(to = %to, "Password reset message handed to mail relay");
        Ok(())
    }
}
