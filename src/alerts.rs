use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use tracing::{info, instrument};

use crate::MetricDefinition;
use crate::config::EmailConfig;

/// Port on which the SMTP server expects TLS from the first byte
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("e-mail address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("e-mail build error: {0}")]
    Build(String),

    #[error("no recipients configured")]
    NoRecipients,
}

/// Static parts of every notification of a deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTemplate {
    pub subject: String,
    pub recipients: Vec<String>,
}

impl From<&EmailConfig> for AlertTemplate {
    fn from(config: &EmailConfig) -> Self {
        Self {
            subject: config.subject.clone(),
            recipients: config.mail_to.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

impl NotificationMessage {
    pub fn breach(template: &AlertTemplate, metric: &MetricDefinition, value: f64) -> Self {
        let body = format!(
            "{} price {value:.6} {} is out of range [{}, {}], attention please!",
            metric.identifier,
            metric.kind.unit(),
            metric.lower_limit,
            metric.upper_limit
        );

        Self {
            subject: template.subject.clone(),
            body,
            recipients: template.recipients.clone(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<(), SendError>;
}

/// Delivers notifications as HTML e-mails through an SMTP relay.
#[derive(Clone)]
pub struct EmailNotifier {
    from: String,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self, SendError> {
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let mut builder = builder.port(config.port);
        if let Some(authorization) = &config.authorization {
            builder = builder.credentials(Credentials::new(
                config.from.clone(),
                authorization.clone(),
            ));
        }

        Ok(Self {
            from: config.from.clone(),
            mailer: builder.build(),
        })
    }

    fn build_email(&self, message: &NotificationMessage) -> Result<Message, SendError> {
        if message.recipients.is_empty() {
            return Err(SendError::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(self.from.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML);

        for recipient in &message.recipients {
            builder = builder.to(recipient.parse()?);
        }

        builder
            .body(message.body.clone())
            .map_err(|e| SendError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    #[instrument(skip_all, fields(recipients = message.recipients.len()))]
    async fn send(&self, message: &NotificationMessage) -> Result<(), SendError> {
        let email = self.build_email(message)?;
        self.mailer.send(email).await?;

        info!("successfully sent e-mail notification");
        Ok(())
    }
}
