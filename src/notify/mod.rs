use std::future::Future;

use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

/// Canal de alertas saliente. La emisión espera el acuse pero no reintenta.
pub trait Notifier: Send + Sync {
    fn emit(
        &self,
        evento: &str,
        payload: Value,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Emisor por webhook HTTP.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            url: config.notify_webhook_url.clone(),
        }
    }
}

impl Notifier for WebhookNotifier {
    async fn emit(&self, evento: &str, payload: Value) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "evento": evento, "payload": payload }))
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError(format!(
                "el canal de alertas respondió {}",
                resp.status()
            )))
        }
    }
}
