use crate::config::{EmailConfig, ConfigError};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use tracing::{error, info, instrument};

/// Email service errors
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SMTP error: {0}")]
    SmtpError(String),

    #[error("Message building error: {0}")]
    MessageError(String),

    #[error("Address error: {0}")]
    AddressError(String),

    #[error("Template error: {0}")]
    TemplateError(String),
}

impl From<ConfigError> for EmailError {
    fn from(err: ConfigError) -> Self {
        EmailError::ConfigError(err.to_string())
    }
}

/// Email message builder
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
}

impl EmailMessage {
    pub fn new(to: String, subject: String) -> Self {
        Self {
            to,
            subject,
            text_body: None,
            html_body: None,
        }
    }

    pub fn with_text_body(mut self, body: String) -> Self {
        self.text_body = Some(body);
        self
    }

    pub fn with_html_body(mut self, body: String) -> Self {
        self.html_body = Some(body);
        self
    }
}

/// Outbound mail operations the services depend on
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError>;

    /// Deliver the signup verification code to a new account's inbox
    async fn send_verification_email(
        &self,
        to: &str,
        username: &str,
        code: &str,
        expires_minutes: i64,
    ) -> Result<(), EmailError>;

    /// Relay a contact form submission to the store inbox
    async fn send_contact_message(
        &self,
        name: &str,
        reply_to: &str,
        body: &str,
    ) -> Result<(), EmailError>;
}

/// SMTP email service implementation
pub struct SmtpEmailService {
    pub config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Create a new SMTP email service
    #[instrument(skip(config), fields(host = %config.smtp_host, port = config.smtp_port))]
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        info!("Initializing SMTP email service");

        config.validate().map_err(EmailError::from)?;

        let mut transport_builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .timeout(Some(std::time::Duration::from_secs(config.connection_timeout_secs)));

        // Configure TLS settings
        if config.use_tls {
            let tls_parameters = TlsParameters::new(config.smtp_host.clone())
                .map_err(|e| EmailError::ConfigError(format!("TLS configuration error: {}", e)))?;

            if config.use_starttls {
                transport_builder = transport_builder.tls(Tls::Required(tls_parameters));
            } else {
                transport_builder = transport_builder.tls(Tls::Wrapper(tls_parameters));
            }
        } else {
            transport_builder = transport_builder.tls(Tls::None);
        }

        // Configure authentication if credentials are provided
        if !config.smtp_username.is_empty() && !config.smtp_password.is_empty() {
            let credentials = Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            );
            transport_builder = transport_builder.credentials(credentials);
        }

        let transport = transport_builder.build();

        info!("SMTP email service initialized successfully");
        Ok(Self { config, transport })
    }

    /// Generate verification email text template
    fn generate_verification_text(&self, username: &str, code: &str, expires_minutes: i64) -> String {
        format!(
            r#"Hello {username},

Welcome to FarmNest! Use the following code to verify your email address:

{code}

This code will expire in {expires_minutes} minutes.

If you did not create a FarmNest account, please ignore this email.

Best regards,
The FarmNest Team

---
This is an automated message. Please do not reply to this email."#,
            username = username,
            code = code,
            expires_minutes = expires_minutes
        )
    }

    /// Generate verification email HTML template
    fn generate_verification_html(&self, username: &str, code: &str, expires_minutes: i64) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Verify your email</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
        }}
        .header {{
            background-color: #f1f8e9;
            padding: 20px;
            text-align: center;
            border-radius: 8px 8px 0 0;
        }}
        .content {{
            background-color: #ffffff;
            padding: 30px;
            border: 1px solid #dee2e6;
        }}
        .code {{
            display: inline-block;
            padding: 12px 24px;
            background-color: #2e7d32;
            color: #ffffff;
            border-radius: 4px;
            font-size: 28px;
            font-weight: bold;
            letter-spacing: 6px;
            margin: 20px 0;
        }}
        .footer {{
            background-color: #f1f8e9;
            padding: 15px;
            text-align: center;
            font-size: 12px;
            color: #6c757d;
            border-radius: 0 0 8px 8px;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1>FarmNest</h1>
        <h2>Verify your email address</h2>
    </div>

    <div class="content">
        <p>Hello {username},</p>

        <p>Welcome to FarmNest! Enter the code below to verify your email address:</p>

        <div style="text-align: center;">
            <span class="code">{code}</span>
        </div>

        <p>This code will expire in {expires_minutes} minutes.</p>

        <p>If you did not create a FarmNest account, please ignore this email.</p>

        <p>Best regards,<br>The FarmNest Team</p>
    </div>

    <div class="footer">
        <p>This is an automated message. Please do not reply to this email.</p>
    </div>
</body>
</html>"#,
            username = html_escape::encode_text(username),
            code = html_escape::encode_text(code),
            expires_minutes = expires_minutes
        )
    }

    /// Generate contact relay text template
    fn generate_contact_text(&self, name: &str, reply_to: &str, body: &str) -> String {
        format!(
            r#"New contact form message

From: {name} <{reply_to}>

{body}"#,
            name = name,
            reply_to = reply_to,
            body = body
        )
    }

    /// Generate contact relay HTML template
    fn generate_contact_html(&self, name: &str, reply_to: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Contact form message</title>
</head>
<body style="font-family: Arial, sans-serif; color: #333;">
    <h2>New contact form message</h2>
    <p><strong>From:</strong> {name} &lt;{reply_to}&gt;</p>
    <p style="white-space: pre-wrap; background-color: #f8f9fa; padding: 15px; border-radius: 4px;">{body}</p>
</body>
</html>"#,
            name = html_escape::encode_text(name),
            reply_to = html_escape::encode_text(reply_to),
            body = html_escape::encode_text(body)
        )
    }

    /// Build a lettre Message from EmailMessage
    fn build_message(&self, email_message: EmailMessage) -> Result<Message, EmailError> {
        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email_message.to
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid to address: {}", e)))?;

        let message_builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email_message.subject);

        match (email_message.text_body, email_message.html_body) {
            (Some(text), Some(html)) => {
                // Multipart message with both text and HTML
                let message = message_builder
                    .multipart(
                        lettre::message::MultiPart::alternative()
                            .singlepart(
                                lettre::message::SinglePart::builder()
                                    .header(ContentType::TEXT_PLAIN)
                                    .body(text),
                            )
                            .singlepart(
                                lettre::message::SinglePart::builder()
                                    .header(ContentType::TEXT_HTML)
                                    .body(html),
                            ),
                    )
                    .map_err(|e| EmailError::MessageError(format!("Failed to build multipart message: {}", e)))?;
                return Ok(message);
            }
            (Some(text), None) => {
                // Text-only message
                let message = message_builder
                    .body(text)
                    .map_err(|e| EmailError::MessageError(format!("Failed to build text message: {}", e)))?;
                return Ok(message);
            }
            (None, Some(html)) => {
                // HTML-only message
                let message = message_builder
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    )
                    .map_err(|e| EmailError::MessageError(format!("Failed to build HTML message: {}", e)))?;
                return Ok(message);
            }
            (None, None) => {
                Err(EmailError::MessageError("No message body provided".to_string()))
            }
        }
    }

    /// Validate email address format
    fn validate_email_address(&self, email: &str) -> Result<(), EmailError> {
        if email.is_empty() {
            return Err(EmailError::AddressError("Email address cannot be empty".to_string()));
        }

        if !email.contains('@') {
            return Err(EmailError::AddressError("Invalid email format".to_string()));
        }

        // Basic email validation
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(EmailError::AddressError("Invalid email format".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    /// Send an email message
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!("Sending email to: {}", message.to);

        self.validate_email_address(&message.to)?;

        let email_message = self.build_message(message)?;

        self.transport
            .send(email_message)
            .await
            .map_err(|e| {
                error!("Failed to send email: {}", e);
                EmailError::SmtpError(format!("Failed to send email: {}", e))
            })?;

        info!("Email sent successfully");
        Ok(())
    }

    #[instrument(skip(self, code), fields(to = %to, username = %username))]
    async fn send_verification_email(
        &self,
        to: &str,
        username: &str,
        code: &str,
        expires_minutes: i64,
    ) -> Result<(), EmailError> {
        info!("Sending verification email to: {}", to);

        let text_body = self.generate_verification_text(username, code, expires_minutes);
        let html_body = self.generate_verification_html(username, code, expires_minutes);

        let message = EmailMessage::new(
            to.to_string(),
            "Verify your email - FarmNest".to_string(),
        )
        .with_text_body(text_body)
        .with_html_body(html_body);

        self.send_email(message).await?;

        info!("Verification email sent successfully");
        Ok(())
    }

    #[instrument(skip(self, body), fields(name = %name, reply_to = %reply_to))]
    async fn send_contact_message(
        &self,
        name: &str,
        reply_to: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        info!("Relaying contact message from: {}", reply_to);

        let text_body = self.generate_contact_text(name, reply_to, body);
        let html_body = self.generate_contact_html(name, reply_to, body);

        let message = EmailMessage::new(
            self.config.contact_inbox.clone(),
            format!("Contact form: message from {}", name),
        )
        .with_text_body(text_body)
        .with_html_body(html_body);

        self.send_email(message).await?;

        info!("Contact message relayed successfully");
        Ok(())
    }
}
