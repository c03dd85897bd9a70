use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Clone, Serialize)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> anyhow::Result<()>;
}

/// Posts mails as JSON to an HTTP mail relay.
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(url: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        let mut req = self.client.post(&self.url).json(&RelayPayload {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            text: &mail.text,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.send()
            .await
            .context("mail relay request")?
            .error_for_status()
            .context("mail relay rejected message")?;
        info!(to = %mail.to, subject = %mail.subject, "mail sent");
        Ok(())
    }
}

/// Used when no relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.text, "mail (log only)");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> std::sync::Arc<dyn Mailer> {
    match &cfg.api_url {
        Some(url) => std::sync::Arc::new(HttpMailer::new(
            url.clone(),
            cfg.api_key.clone(),
            cfg.from.clone(),
        )),
        None => std::sync::Arc::new(LogMailer),
    }
}
