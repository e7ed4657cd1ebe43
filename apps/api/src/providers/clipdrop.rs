//! Text-to-image provider (Clipdrop). Form-encoded prompt in, raw PNG
//! bytes out. The client is only constructed when an API key is configured,
//! so a missing key can never reach the network.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client};

use crate::errors::AppError;
use crate::providers::ProviderError;

const TEXT_TO_IMAGE_URL: &str = "https://clipdrop-api.co/text-to-image/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// The image-generation boundary.
#[async_trait]
pub trait TextToImage: Send + Sync {
    /// Renders a prompt into raw PNG bytes.
    async fn text_to_image(&self, prompt: &str) -> Result<Bytes, AppError>;
}

pub struct ClipdropClient {
    client: Client,
    api_key: String,
}

impl ClipdropClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn call(&self, prompt: &str) -> Result<Bytes, ProviderError> {
        let form = multipart::Form::new().text("prompt", prompt.to_string());

        let response = self
            .client
            .post(TEXT_TO_IMAGE_URL)
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl TextToImage for ClipdropClient {
    async fn text_to_image(&self, prompt: &str) -> Result<Bytes, AppError> {
        Ok(self.call(prompt).await?)
    }
}
