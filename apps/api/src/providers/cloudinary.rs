//! Media storage and transformation (Cloudinary upload API).
//!
//! Uploads are signed: SHA-1 over the alphabetically-sorted request params
//! concatenated with the API secret, hex-encoded. Transformations apply
//! either at upload time (`transformation` param) or afterwards by URL
//! construction against a stored `public_id`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::errors::AppError;
use crate::providers::ProviderError;

const UPLOAD_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A stored asset: its addressable id plus the durable HTTPS URL.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    pub public_id: String,
    pub secure_url: String,
}

/// The media-storage boundary used by the image capabilities.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads a base64 data URI, optionally applying a transformation.
    async fn upload_data_uri(
        &self,
        data_uri: &str,
        transformation: Option<&str>,
    ) -> Result<UploadedMedia, AppError>;

    /// Uploads raw image bytes, optionally applying a transformation.
    async fn upload_bytes(
        &self,
        bytes: Vec<u8>,
        transformation: Option<&str>,
    ) -> Result<UploadedMedia, AppError>;

    /// Builds a delivery URL that applies `transformation` to a stored asset.
    fn transform_url(&self, public_id: &str, transformation: &str) -> String;
}

enum FilePayload {
    DataUri(String),
    Bytes(Vec<u8>),
}

pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryClient {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    fn upload_url(&self) -> String {
        format!("{UPLOAD_API_BASE}/{}/image/upload", self.cloud_name)
    }

    async fn upload(
        &self,
        file: FilePayload,
        transformation: Option<&str>,
    ) -> Result<UploadedMedia, ProviderError> {
        let timestamp = Utc::now().timestamp().to_string();

        let mut signed_params: Vec<(&str, &str)> = vec![("timestamp", timestamp.as_str())];
        if let Some(t) = transformation {
            signed_params.push(("transformation", t));
        }
        let signature = sign(&signed_params, &self.api_secret);

        let mut form = multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.clone())
            .text("signature", signature);
        if let Some(t) = transformation {
            form = form.text("transformation", t.to_string());
        }
        form = match file {
            FilePayload::DataUri(uri) => form.text("file", uri),
            FilePayload::Bytes(bytes) => {
                form.part("file", multipart::Part::bytes(bytes).file_name("upload"))
            }
        };

        let response = self
            .client
            .post(self.upload_url())
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

        // Decode by hand so a malformed body surfaces as a parse error
        // rather than a generic HTTP error.
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload_data_uri(
        &self,
        data_uri: &str,
        transformation: Option<&str>,
    ) -> Result<UploadedMedia, AppError> {
        Ok(self
            .upload(FilePayload::DataUri(data_uri.to_string()), transformation)
            .await?)
    }

    async fn upload_bytes(
        &self,
        bytes: Vec<u8>,
        transformation: Option<&str>,
    ) -> Result<UploadedMedia, AppError> {
        Ok(self.upload(FilePayload::Bytes(bytes), transformation).await?)
    }

    fn transform_url(&self, public_id: &str, transformation: &str) -> String {
        format!(
            "{DELIVERY_BASE}/{}/image/upload/{transformation}/{public_id}",
            self.cloud_name
        )
    }
}

/// Alphabetically-ordered `key=value` pairs joined with `&`: the exact
/// string the upload API expects to be signed.
fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|&(key, _)| key);
    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
