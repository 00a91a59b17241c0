use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{ AppError, Result };

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivery seam for triggered alerts; tests record sends instead of
/// talking to FCM.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, title: &str, body: &str, device_token: &str) -> Result<()>;
}

/// FCM legacy HTTP sender. The server key comes from configuration and is
/// passed as the Authorization header on every request.
pub struct FcmClient {
    client: reqwest::Client,
    server_key: String,
}

impl FcmClient {
    pub fn new(server_key: String) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(SEND_TIMEOUT).build().unwrap_or_default(),
            server_key,
        }
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(&self, title: &str, body: &str, device_token: &str) -> Result<()> {
        let payload = json!({
            "to": device_token,
            "notification": {
                "title": title,
                "body": body,
            },
        });

        let response = self.client
            .post(FCM_SEND_URL)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send().await
            .map_err(|e| AppError::Notify(format!("push request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Notify(format!("push endpoint returned {}: {}", status, detail)));
        }

        Ok(())
    }
}
