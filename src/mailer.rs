//! Outbound email for password reset links.
//!
//! `ResendMailer` posts to the Resend HTTP API. Without an API key the
//! service falls back to `LogMailer`, which only records the send in the
//! log. `MemoryMailer` keeps messages in memory for tests and local runs.

use std::sync::Mutex;

use futures_util::future::BoxFuture;
use serde::Serialize;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(String),
    #[error("Mail provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), MailError>>;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}

/// Resend (resend.com) transactional email.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl Mailer for ResendMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            let body = ResendRequest {
                from: &self.from,
                to: &mail.to,
                subject: &mail.subject,
                html: &mail.html,
            };

            let response = self
                .client
                .post(RESEND_ENDPOINT)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| MailError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MailError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "resend"
    }
}

/// Logs instead of sending. Used when no mail provider is configured.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            tracing::warn!(
                to = %mail.to,
                subject = %mail.subject,
                "No mail provider configured; message not delivered"
            );
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Keeps every message in memory.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Mailer for MemoryMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            self.sent
                .lock()
                .map_err(|_| MailError::Transport("mailbox lock poisoned".into()))?
                .push(mail.clone());
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Reset email body. `name` is escaped; `reset_url` is built by us.
pub fn password_reset_mail(to: &str, name: &str, reset_url: &str) -> OutgoingMail {
    let html = format!(
        "<div style=\"font-family:Arial,sans-serif;max-width:480px;margin:0 auto;padding:20px;\">\
         <h2 style=\"color:#10b981;\">{app}</h2>\
         <p>Hi {name},</p>\
         <p>Click below to reset your password:</p>\
         <a href=\"{reset_url}\" style=\"display:inline-block;background-color:#10b981;color:white;\
         padding:12px 24px;text-decoration:none;border-radius:6px;margin:16px 0;\">Reset Password</a>\
         <p style=\"color:#666;font-size:14px;\">This link expires in 1 hour.</p></div>",
        app = crate::config::APP_NAME,
        name = escape_html(name),
    );
    OutgoingMail {
        to: to.to_string(),
        subject: format!("Reset your {} password", crate::config::APP_NAME),
        html,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
