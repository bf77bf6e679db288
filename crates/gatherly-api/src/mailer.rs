// Outbound email for verification and password-reset links
//
// SMTP is optional: without SMTP_HOST the mailer runs in disabled mode and
// logs the links instead, so local development needs no mail server.
// Delivery is fire-and-forget; a slow relay must not hold up the response.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::Arc;

#[derive(Clone)]
pub struct Mailer {
    inner: Arc<MailerInner>,
    frontend_url: String,
}

enum MailerInner {
    Smtp {
        transport: SmtpTransport,
        from: Mailbox,
    },
    Disabled,
}

impl Mailer {
    /// Build from SMTP_* environment variables; disabled when SMTP_HOST is unset
    pub fn from_env(frontend_url: &str) -> anyhow::Result<Self> {
        let inner = match std::env::var("SMTP_HOST") {
            Ok(host) => {
                let user = std::env::var("SMTP_USER").unwrap_or_default();
                let pass = std::env::var("SMTP_PASS").unwrap_or_default();
                let from: Mailbox = std::env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "Gatherly <no-reply@gatherly.local>".to_string())
                    .parse()?;

                let mut builder = SmtpTransport::relay(&host)?;
                if let Ok(port) = std::env::var("SMTP_PORT") {
                    builder = builder.port(port.parse()?);
                }
                if !user.is_empty() {
                    builder = builder.credentials(Credentials::new(user, pass));
                }

                tracing::info!(host = %host, "SMTP mailer configured");
                MailerInner::Smtp {
                    transport: builder.build(),
                    from,
                }
            }
            Err(_) => {
                tracing::warn!("SMTP_HOST not set, email delivery disabled");
                MailerInner::Disabled
            }
        };

        Ok(Self {
            inner: Arc::new(inner),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(MailerInner::Disabled),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }

    pub fn send_verification(&self, to: &str, token: &str) {
        let link = format!("{}/verify-email?token={}", self.frontend_url, token);
        self.send(
            to,
            "Verify your Gatherly account",
            format!(
                "Welcome to Gatherly!\n\n\
                 Please confirm your email address by opening the link below:\n\n{link}\n\n\
                 If you did not create an account, you can ignore this message.\n"
            ),
        );
    }

    pub fn send_password_reset(&self, to: &str, token: &str) {
        let link = format!("{}/reset-password?token={}", self.frontend_url, token);
        self.send(
            to,
            "Reset your Gatherly password",
            format!(
                "A password reset was requested for your account.\n\n\
                 Open the link below within one hour to choose a new password:\n\n{link}\n\n\
                 If you did not request this, no action is needed.\n"
            ),
        );
    }

    fn send(&self, to: &str, subject: &str, body: String) {
        let inner = self.inner.clone();
        let to = to.to_string();
        let subject = subject.to_string();

        tokio::task::spawn_blocking(move || {
            let MailerInner::Smtp { transport, from } = &*inner else {
                tracing::info!(to = %to, subject = %subject, "email delivery disabled, skipping");
                return;
            };

            let recipient: Mailbox = match to.parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    tracing::warn!(to = %to, "invalid recipient address: {e}");
                    return;
                }
            };

            let message = Message::builder()
                .from(from.clone())
                .to(recipient)
                .subject(&subject)
                .body(body);

            match message {
                Ok(message) => match transport.send(&message) {
                    Ok(_) => tracing::debug!(to = %to, subject = %subject, "email sent"),
                    Err(e) => tracing::error!(to = %to, "failed to send email: {e}"),
                },
                Err(e) => tracing::error!(to = %to, "failed to build email: {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_does_not_panic() {
        let mailer = Mailer::disabled();
        mailer.send_verification("user@example.com", "abc123");
        mailer.send_password_reset("user@example.com", "def456");
        // give the spawned tasks a chance to run
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_frontend_url_trailing_slash_trimmed() {
        let mailer = Mailer {
            inner: Arc::new(MailerInner::Disabled),
            frontend_url: "http://localhost:3000/".trim_end_matches('/').to_string(),
        };
        assert_eq!(mailer.frontend_url, "http://localhost:3000");
    }
}
