//! Receipt Mail Delivery
//!
//! A small mailer seam with a Resend HTTP implementation for production and
//! an in-memory double for tests. Delivery failure is reported, never
//! retried here; the provider's webhook retry is the only retry loop.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

const RESEND_BASE_URL: &str = "https://api.resend.com";

/// An email ready to send
#[derive(Clone, Debug, Serialize)]
pub struct OutboundMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Mail delivery seam
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a mail; returns the provider's message id
    async fn send(&self, mail: OutboundMail) -> Result<String>;
}

/// Resend HTTP API mailer
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: RESEND_BASE_URL.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("RESEND_API_KEY")
            .map_err(|_| PaymentError::Config("RESEND_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Point the mailer at a different endpoint (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, mail: OutboundMail) -> Result<String> {
        let url = format!("{}/emails", self.base_url);
        let request = ResendRequest {
            from: &mail.from,
            to: [&mail.to],
            subject: &mail.subject,
            html: &mail.html,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Delivery(format!(
                "mail API returned {}",
                response.status()
            )));
        }

        let body: ResendResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Delivery(e.to_string()))?;

        tracing::info!(message_id = %body.id, to = %mail.to, "receipt sent");
        Ok(body.id)
    }
}

/// In-memory mailer (for development and tests)
pub struct MemoryMailer {
    sent: RwLock<Vec<OutboundMail>>,
    failing: bool,
}

impl Default for MemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            failing: false,
        }
    }

    /// A mailer whose every send fails
    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            failing: true,
        }
    }

    /// Mails delivered so far
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.read().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: OutboundMail) -> Result<String> {
        if self.failing {
            return Err(PaymentError::Delivery("simulated mail failure".into()));
        }
        let mut sent = self.sent.write().unwrap();
        sent.push(mail);
        Ok(format!("mem-{}", sent.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> OutboundMail {
        OutboundMail {
            from: "Support <support@example.com>".into(),
            to: "buyer@example.com".into(),
            subject: "Receipt".into(),
            html: "<p>Thanks</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_memory_mailer_records_sends() {
        let mailer = MemoryMailer::new();
        let id = mailer.send(mail()).await.unwrap();
        assert_eq!(id, "mem-1");
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].to, "buyer@example.com");
    }

    #[tokio::test]
    async fn test_failing_mailer_reports_delivery_error() {
        let mailer = MemoryMailer::failing();
        let err = mailer.send(mail()).await.unwrap_err();
        assert!(matches!(err, PaymentError::Delivery(_)));
        assert!(mailer.sent().is_empty());
    }
}
