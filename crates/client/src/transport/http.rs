//! HTTPS transport: one GET request carrying the public key, one envelope back.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::protocol::{
    EncryptResponseBody, IV_HEADER, PUBLIC_KEY_HEADER, TAG_HEADER, WRAPPED_KEY_HEADER,
};
use common::{ClientError, EncryptedEnvelope};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use tracing::{debug, warn};

use super::EnvelopeSource;
use crate::config::{BearerToken, Config};

/// [`EnvelopeSource`] backed by a single `reqwest` client.
///
/// Certificate verification and the request timeout are properties of this
/// client instance only; nothing process-wide is changed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint_url: String,
    bearer_token: BearerToken,
}

impl HttpTransport {
    /// Build the HTTP client from `cfg`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(cfg: &Config) -> Result<Self, ClientError> {
        if cfg.accept_invalid_certs {
            warn!(
                endpoint = %cfg.endpoint_url,
                "TLS certificate verification is DISABLED for this client"
            );
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint_url: cfg.endpoint_url.clone(),
            bearer_token: cfg.bearer_token.clone(),
        })
    }

    /// Send the public key and bearer token, and decode the envelope from the
    /// response.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] if no response was received.
    /// - [`ClientError::HttpStatus`] on a non-2xx status.
    /// - [`ClientError::MalformedResponse`] if a header or the body is missing
    ///   or not decodable.
    pub async fn submit_public_key(
        &self,
        public_key_b64: &str,
    ) -> Result<EncryptedEnvelope, ClientError> {
        debug!(endpoint = %self.endpoint_url, "submitting public key");

        let response = self
            .client
            .get(&self.endpoint_url)
            .header(PUBLIC_KEY_HEADER, public_key_b64)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.bearer_token.expose()),
            )
            .send()
            .await
            .map_err(|e| ClientError::Transport(error_chain(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<body unreadable: {}>", error_chain(&e)),
            };
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(error_chain(&e)))?;

        let envelope = decode_envelope(&headers, &body)?;
        debug!(
            status = status.as_u16(),
            ciphertext_len = envelope.ciphertext.len(),
            iv_len = envelope.iv.len(),
            auth_tag_len = envelope.auth_tag.len(),
            wrapped_key_len = envelope.wrapped_key.len(),
            "envelope received"
        );
        Ok(envelope)
    }
}

impl EnvelopeSource for HttpTransport {
    async fn fetch_envelope(&self, public_key_b64: &str) -> Result<EncryptedEnvelope, ClientError> {
        self.submit_public_key(public_key_b64).await
    }
}

/// Assemble an [`EncryptedEnvelope`] from response headers and a JSON body.
///
/// # Errors
///
/// Returns [`ClientError::MalformedResponse`] naming the first missing or
/// undecodable field.
pub fn decode_envelope(headers: &HeaderMap, body: &[u8]) -> Result<EncryptedEnvelope, ClientError> {
    let iv = header_bytes(headers, IV_HEADER)?;
    let auth_tag = header_bytes(headers, TAG_HEADER)?;
    let wrapped_key = header_bytes(headers, WRAPPED_KEY_HEADER)?;

    let body: EncryptResponseBody = serde_json::from_slice(body).map_err(|e| {
        ClientError::MalformedResponse(format!(
            "body is not a JSON object with a string `data` field: {e}"
        ))
    })?;
    let ciphertext = decode_b64("data", &body.data)?;

    Ok(EncryptedEnvelope {
        ciphertext,
        iv,
        auth_tag,
        wrapped_key,
    })
}

fn header_bytes(headers: &HeaderMap, name: &str) -> Result<Vec<u8>, ClientError> {
    let value = headers
        .get(name)
        .ok_or_else(|| ClientError::MalformedResponse(format!("missing {name} header")))?;
    let text = value.to_str().map_err(|_| {
        ClientError::MalformedResponse(format!("{name} header contains non-ASCII characters"))
    })?;
    decode_b64(name, text.trim())
}

fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>, ClientError> {
    BASE64
        .decode(value)
        .map_err(|e| ClientError::MalformedResponse(format!("{field} is not valid base64: {e}")))
}

/// Flatten an error and its sources into one line; `reqwest` keeps the
/// useful part (DNS, TLS, timeout) in the source chain.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}
