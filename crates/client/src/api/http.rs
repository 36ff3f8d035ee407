//! HTTP implementation of the commerce backend.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use pomelo_core::{Email, ProductId};

use crate::config::ClientConfig;

use super::types::{
    AuthRequest, AuthResponse, CurrentUserResponse, OrderConfirmation, OrderLine, OrderRequest,
    ProductPayload,
};
use super::{ApiError, CommerceBackend};

/// REST client for the commerce backend.
pub struct HttpBackend {
    client: reqwest::Client,
    /// Base URL without a trailing slash.
    base: String,
}

impl HttpBackend {
    /// Create a backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }
}

impl CommerceBackend for HttpBackend {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn authenticate(&self, email: &Email, password: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.endpoint("auth/login"))
            .json(&AuthRequest {
                email: email.as_str(),
                password,
            })
            .send()
            .await?;

        let auth: AuthResponse = parse_response(response).await?;
        Ok(auth.token)
    }

    #[instrument(skip(self, token))]
    async fn current_user(
        &self,
        token: &SecretString,
    ) -> Result<CurrentUserResponse, ApiError> {
        let response = self
            .client
            .get(self.endpoint("auth/me"))
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        parse_response(response).await
    }

    #[instrument(skip(self))]
    async fn fetch_product(&self, id: &ProductId) -> Result<ProductPayload, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("products/{id}")))
            .send()
            .await?;

        parse_response(response).await
    }

    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<ProductPayload>, ApiError> {
        let response = self.client.get(self.endpoint("products")).send().await?;

        parse_response(response).await
    }

    #[instrument(skip(self, token), fields(lines = lines.len()))]
    async fn submit_order(
        &self,
        token: &SecretString,
        lines: &[OrderLine],
    ) -> Result<OrderConfirmation, ApiError> {
        let response = self
            .client
            .post(self.endpoint("orders"))
            .bearer_auth(token.expose_secret())
            .json(&OrderRequest { lines })
            .send()
            .await?;

        parse_response(response).await
    }
}

/// Error body shape the backend uses for non-success responses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Turn a response into the expected body or a status error.
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(serde_json::from_str(&body)?)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            message: extract_message(&body),
        })
    }
}

/// Best-effort extraction of a human-readable error message.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message.or(parsed.error))
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_prefers_json_message() {
        assert_eq!(
            extract_message(r#"{"message": "out of stock"}"#),
            "out of stock"
        );
        assert_eq!(extract_message(r#"{"error": "bad token"}"#), "bad token");
    }

    #[test]
    fn test_extract_message_falls_back_to_body() {
        assert_eq!(extract_message("  plain text  "), "plain text");
    }
}
