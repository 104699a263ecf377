mod ses_email_client;
mod templates;

use crate::domain::CustomerEmail;
use async_trait::async_trait;
pub use ses_email_client::SesEmailClient;
pub use templates::*;

#[async_trait]
pub trait Email: Send + Sync {
    async fn send_email(
        &self,
        recipient: &CustomerEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error>;
}

/// Sends a templated notification. Delivery failures are logged and
/// swallowed: a lost email never fails the request that triggered it.
pub async fn notify(email_client: &dyn Email, recipient: &CustomerEmail, message: Notification) {
    let html = wrap_in_html(&message.text);
    if let Err(error) = email_client
        .send_email(recipient, message.subject, &html, &message.text)
        .await
    {
        tracing::warn!(
            error.cause_chain = ?error,
            subject = message.subject,
            "Failed to send a notification email"
        );
    }
}
