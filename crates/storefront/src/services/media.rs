//! Media storage client.
//!
//! Uploads images to external object storage and destroys them again. The
//! record layer only ever stores the resolved [`PhotoRef`]; handlers stage
//! uploads before committing a record and destroy staged uploads again if
//! the commit fails.

use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::MediaConfig;
use crate::models::product::PhotoRef;

/// Upload timeout; image transfers are slower than plain API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the media storage service.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Transport-level failure (connection, timeout, decode).
    #[error("media storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage service rejected the request.
    #[error("media storage error ({status}): {message}")]
    Storage {
        /// HTTP status returned by the service.
        status: u16,
        /// Service-provided error body, verbatim.
        message: String,
    },
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

/// Client for the media storage API.
#[derive(Clone)]
pub struct MediaClient {
    http: Client,
    api_base: String,
    config: MediaConfig,
}

impl MediaClient {
    /// Create a new media client with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(config: &MediaConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            config: config.clone(),
        })
    }

    /// Upload an image from a source URL into a folder, returning the
    /// resolved reference to store.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Http` on transport failure and
    /// `MediaError::Storage` when the service refuses the upload.
    pub async fn upload(&self, source_url: &str, folder: &str) -> Result<PhotoRef, MediaError> {
        let response = self
            .http
            .post(format!("{}/v1/media", self.api_base))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&json!({ "file": source_url, "folder": folder }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Storage {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded = response.json::<UploadResponse>().await?;
        Ok(PhotoRef {
            id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    /// Destroy a previously uploaded image.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Http` on transport failure and
    /// `MediaError::Storage` when the service refuses the deletion.
    pub async fn destroy(&self, media_id: &str) -> Result<(), MediaError> {
        let response = self
            .http
            .delete(format!("{}/v1/media/{media_id}", self.api_base))
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Storage {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Destroy a batch of uploads, logging failures instead of returning
    /// them.
    ///
    /// Used on the compensation paths (a staged upload whose record commit
    /// failed, or an old image replaced by a committed record) where the
    /// caller has nothing left to roll back.
    pub async fn destroy_best_effort(&self, photos: &[PhotoRef]) {
        for photo in photos {
            if let Err(err) = self.destroy(&photo.id).await {
                tracing::warn!(media_id = %photo.id, error = %err, "failed to destroy media");
            }
        }
    }

    /// The folder product images land in.
    #[must_use]
    pub fn product_folder(&self) -> &str {
        &self.config.product_folder
    }

    /// The folder user avatars land in.
    #[must_use]
    pub fn user_folder(&self) -> &str {
        &self.config.user_folder
    }
}
