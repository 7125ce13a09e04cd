//! Interface-level media transfer against the upload endpoint.
//!
//! Bodies are sealed with the crypto kit's AES-GCM chunk stream; the key
//! travels to the peer out of band (inside the message payload).

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use dittoweb_crypto::MediaKey;
use dittoweb_pblite::WireFormat;

use crate::client::Client;
use crate::consts::UPLOAD_URL;
use crate::error::{ClientError, RequestError};

/// Result of an upload: the server-assigned id plus the decryption key.
pub struct MediaUpload {
    pub media_id: String,
    pub key: MediaKey,
}

impl Client {
    /// Encrypt and upload a media body.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure or a non-2xx
    /// status.
    pub async fn upload_media(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<MediaUpload, ClientError> {
        let key = MediaKey::generate();
        let encrypted = key.encrypt_stream(data);
        debug!(size = encrypted.len(), mime_type, "uploading media");

        let response = self
            .http()
            .raw()
            .post(UPLOAD_URL)
            .headers(self.http().request_headers(WireFormat::Pblite))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("x-goog-upload-protocol", "raw")
            .header("x-goog-upload-content-type", mime_type)
            .body(encrypted)
            .send()
            .await
            .map_err(RequestError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }
            .into());
        }
        let media_id = response.text().await.map_err(RequestError::from)?;
        if media_id.is_empty() {
            return Err(RequestError::InvalidResponse("upload returned no media id").into());
        }
        Ok(MediaUpload { media_id, key })
    }

    /// Download and decrypt a media body.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] on transport failure, a non-2xx status,
    /// or a body that fails authentication.
    pub async fn download_media(
        &self,
        media_id: &str,
        key: &MediaKey,
    ) -> Result<Vec<u8>, ClientError> {
        let url = format!("{UPLOAD_URL}/{media_id}");
        debug!(%url, "downloading media");

        let response = self
            .http()
            .raw()
            .get(&url)
            .headers(self.http().request_headers(WireFormat::Pblite))
            .send()
            .await
            .map_err(RequestError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }
            .into());
        }
        let body = response.bytes().await.map_err(RequestError::from)?;
        Ok(key.decrypt_stream(&body)?)
    }
}
