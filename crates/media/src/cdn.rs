//! Image store backed by a signed-upload image CDN.
//!
//! Uploads are multipart POSTs authenticated with an HMAC-SHA256 signature
//! over the request parameters. Thumbnails are never stored; the CDN
//! renders them on demand from a transformation segment in the URL.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::multipart::{Form, Part};
use sha2::Sha256;

use crate::config::CdnConfig;
use crate::error::MediaError;
use crate::store::{validate_key, ImageStore, StoredImage, Variant};

/// HTTP timeout for a single CDN call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transformation used for thumbnail delivery URLs.
pub const THUMBNAIL_TRANSFORMATION: &str = "c_fill,w_320,h_240";

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 over `k=v` pairs joined with `&` in key order.
pub fn sign_params(params: &BTreeMap<&str, String>, secret: &str) -> String {
    let payload = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    format!("{:x}", mac.finalize().into_bytes())
}

/// Drop the file extension from the last path segment.
fn strip_extension(key: &str) -> &str {
    let name_start = key.rfind('/').map_or(0, |i| i + 1);
    match key[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &key[..name_start + dot],
        _ => key,
    }
}

/// Uploads to and deletes from a remote image CDN.
pub struct CdnImageStore {
    client: reqwest::Client,
    config: CdnConfig,
}

impl CdnImageStore {
    pub fn new(config: CdnConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    fn signed_params(&self, key: &str) -> (BTreeMap<&'static str, String>, String) {
        let mut params = BTreeMap::new();
        params.insert("folder", self.config.folder.clone());
        params.insert("public_id", strip_extension(key).to_string());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.config.api_secret);
        (params, signature)
    }

    /// Turn a non-2xx response into [`MediaError::Upstream`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MediaError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ImageStore for CdnImageStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredImage, MediaError> {
        validate_key(key)?;
        let len = bytes.len();
        let file_name = key.rsplit('/').next().unwrap_or(key).to_string();
        let (params, signature) = self.signed_params(key);

        let file = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type)?;
        let mut form = Form::new().part("file", file);
        for (name, value) in params {
            form = form.text(name, value);
        }
        let form = form
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);

        let response = self
            .client
            .post(&self.config.upload_url)
            .multipart(form)
            .send()
            .await?;
        Self::check(response).await?;
        tracing::debug!(key, bytes = len, "Uploaded image to CDN");

        Ok(StoredImage {
            key: key.to_string(),
            url: self.url_for(key, Variant::Original),
            thumbnail_url: Some(self.url_for(key, Variant::Thumbnail)),
            bytes: len,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), MediaError> {
        validate_key(key)?;
        let (params, signature) = self.signed_params(key);
        let mut form: Vec<(&str, String)> = params.into_iter().collect();
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));

        let url = format!("{}/destroy", self.config.upload_url.trim_end_matches('/'));
        let response = self.client.post(&url).form(&form).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    fn url_for(&self, key: &str, variant: Variant) -> String {
        let base = self.config.delivery_url.trim_end_matches('/');
        let folder = &self.config.folder;
        match variant {
            Variant::Original => format!("{base}/{folder}/{key}"),
            Variant::Thumbnail => format!("{base}/{THUMBNAIL_TRANSFORMATION}/{folder}/{key}"),
        }
    }

    fn name(&self) -> &'static str {
        "cdn"
    }
}
