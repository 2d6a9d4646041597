use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use parley_engine::{Mailer, OutgoingEmail};

/// SMTP relay with credentials, sending as the authenticated account
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, user: &str, password: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("invalid SMTP relay {}", host))?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        let from = user
            .parse()
            .with_context(|| format!("invalid sender address {}", user))?;

        Ok(Self { transport, from })
    }

    fn build(&self, email: &OutgoingEmail) -> Result<Message> {
        let to: Mailbox = email
            .to
            .parse()
            .with_context(|| format!("invalid recipient {}", email.to))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .context("failed to build email")
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let message = self.build(&email)?;
        self.transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Used when no SMTP account is configured; writes the email to the log
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        tracing::warn!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "mail transport not configured, email logged only"
        );
        Ok(())
    }
}
