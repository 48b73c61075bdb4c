//! The linear hybrid-unwrap run: key generation, submission, unwrap, decrypt.
//!
//! ```text
//! Init ─► KeyGenerated ─► ResponseReceived ─► KeyUnwrapped ─► Decrypted
//!   └──────────┴──────────────────┴─────────────────┴──► Failed
//! ```
//!
//! Every failure is terminal. There is no retry and no partial output: the
//! plaintext is only returned once the GCM tag has been verified.

use common::ClientError;
use tracing::{debug, info, warn};

use crate::crypto::{decrypt_payload, Identity};
use crate::transport::EnvelopeSource;

/// Position of a run in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Init,
    /// The RSA key pair exists.
    KeyGenerated,
    /// The server returned a decodable envelope.
    ResponseReceived,
    /// The AES key has been recovered.
    KeyUnwrapped,
    /// The payload has been authenticated and decrypted.
    Decrypted,
    /// A step failed; the run is over.
    Failed,
}

/// Drives one hybrid-unwrap run against an [`EnvelopeSource`].
///
/// [`HybridUnwrapClient::run`] consumes the client, so an instance runs
/// exactly once and a fresh key pair is generated for every run.
#[derive(Debug)]
pub struct HybridUnwrapClient<S> {
    source: S,
    stage: Stage,
}

impl<S: EnvelopeSource> HybridUnwrapClient<S> {
    /// Create a client that will fetch its envelope from `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            stage: Stage::Init,
        }
    }

    /// Stage the client has reached.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run the whole pipeline and return the authenticated plaintext.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the first step that failed; later steps
    /// are not attempted.
    pub async fn run(mut self) -> Result<Vec<u8>, ClientError> {
        match self.drive().await {
            Ok(plaintext) => {
                info!(plaintext_len = plaintext.len(), "payload decrypted");
                Ok(plaintext)
            }
            Err(e) => {
                warn!(
                    reached = ?self.stage,
                    failed_stage = e.stage(),
                    "run aborted"
                );
                self.advance(Stage::Failed);
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<Vec<u8>, ClientError> {
        // RSA key generation is CPU-bound; keep it off the async workers.
        let identity = tokio::task::spawn_blocking(Identity::generate)
            .await
            .map_err(|e| ClientError::KeyGen(format!("key generation task failed: {e}")))??;
        let public_key = identity.public_key_b64()?;
        self.advance(Stage::KeyGenerated);

        let envelope = self.source.fetch_envelope(&public_key).await?;
        self.advance(Stage::ResponseReceived);

        let key = identity.unwrap_key(&envelope.wrapped_key)?;
        self.advance(Stage::KeyUnwrapped);

        let plaintext = decrypt_payload(
            &envelope.ciphertext,
            &envelope.iv,
            &envelope.auth_tag,
            key.as_bytes(),
        )?;
        self.advance(Stage::Decrypted);

        Ok(plaintext)
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = ?self.stage, to = ?next, "stage transition");
        self.stage = next;
    }
}
