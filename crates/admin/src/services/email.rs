//! Email delivery for accounts created from the panel.
//!
//! Uses SMTP via lettre with Askama HTML templates. Accounts created here
//! start inactive and receive an activation link that opens on the
//! storefront, so the service is built against the storefront's base URL.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;

/// HTML template for the account activation email.
#[derive(Template)]
#[template(path = "email/activation.html")]
struct ActivationEmailHtml<'a> {
    first_name: &'a str,
    activation_link: &'a str,
}

/// Plain text template for the account activation email.
#[derive(Template)]
#[template(path = "email/activation.txt")]
struct ActivationEmailText<'a> {
    first_name: &'a str,
    activation_link: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    storefront_base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// Activation links in outgoing mail are built against
    /// `storefront_base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if SMTP connection fails.
    pub fn new(config: &SmtpConfig, storefront_base_url: &str) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            storefront_base_url: storefront_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send the account activation email with a signed activation link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_activation_email(
        &self,
        to: &str,
        first_name: &str,
        uid: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let activation_link = format!("{}/activar/{uid}/{token}", self.storefront_base_url);
        let html = ActivationEmailHtml {
            first_name,
            activation_link: &activation_link,
        }
        .render()?;
        let text = ActivationEmailText {
            first_name,
            activation_link: &activation_link,
        }
        .render()?;

        self.send_multipart_email(to, "Activa tu cuenta en Liher Fashion", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
