//! Delivery of the client public key and retrieval of the encrypted envelope.
//!
//! The pipeline only sees the [`EnvelopeSource`] trait. [`HttpTransport`] is
//! the production implementation; tests substitute in-process sources.

pub mod http;

use std::future::Future;

use common::{ClientError, EncryptedEnvelope};

pub use http::HttpTransport;

/// Anything that can exchange a public key for an [`EncryptedEnvelope`].
pub trait EnvelopeSource {
    /// Present `public_key_b64` (base64 DER SubjectPublicKeyInfo) and return
    /// the decoded envelope the server produced for it.
    ///
    /// Exactly one attempt is made; every failure is returned as-is.
    fn fetch_envelope(
        &self,
        public_key_b64: &str,
    ) -> impl Future<Output = Result<EncryptedEnvelope, ClientError>> + Send;
}
