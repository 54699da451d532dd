use async_trait::async_trait;

use crate::error::AppError;
use crate::models::delivery::CompletionReport;

/// Backend operations the tracking session depends on.
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    async fn complete_delivery(&self, report: &CompletionReport) -> Result<(), AppError>;
}

pub struct HttpDeliveryApi {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpDeliveryApi {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl DeliveryApi for HttpDeliveryApi {
    async fn complete_delivery(&self, report: &CompletionReport) -> Result<(), AppError> {
        let mut builder = self.client.post(self.url("/deliveries/complete")).json(report);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| AppError::Upstream(format!("complete delivery request failed: {err}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(AppError::Upstream(format!(
            "complete delivery rejected with status {}: {}",
            status.as_u16(),
            detail.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::HttpDeliveryApi;

    #[test]
    fn joins_base_url_without_double_slash() {
        let api = HttpDeliveryApi::new(reqwest::Client::new(), "http://localhost:5000/api/", None);
        assert_eq!(
            api.url("/deliveries/complete"),
            "http://localhost:5000/api/deliveries/complete"
        );
    }
}
