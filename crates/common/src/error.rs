//! Error taxonomy for a single hybrid-unwrap run.

use thiserror::Error;

/// Top-level client error type.
///
/// Every variant is terminal for the run. Variants map to process exit codes:
/// - [`ClientError::KeyGen`] → 10
/// - [`ClientError::Transport`] → 20
/// - [`ClientError::HttpStatus`] → 21
/// - [`ClientError::MalformedResponse`] → 22
/// - [`ClientError::KeyUnwrap`] → 30
/// - [`ClientError::AuthenticationFailure`] → 40
/// - [`ClientError::Decrypt`] → 41
#[derive(Debug, Error)]
pub enum ClientError {
    /// The RSA key pair could not be generated or exported.
    #[error("key generation failed: {0}")]
    KeyGen(String),

    /// The request never produced an HTTP response (network, TLS, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body text, possibly empty.
        body: String,
    },

    /// A required header or body field is absent or not decodable.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The wrapped key did not decrypt under RSA-OAEP(SHA-256) to a usable key.
    #[error("key unwrap failed: {0}")]
    KeyUnwrap(String),

    /// The GCM tag did not validate; no plaintext was released.
    #[error("authentication failure: ciphertext, iv or tag was altered, or the key is wrong")]
    AuthenticationFailure,

    /// The decrypt inputs had an invalid shape (nonce, tag or key length).
    #[error("decryption failed: {0}")]
    Decrypt(String),
}

impl ClientError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::KeyGen(_) => 10,
            ClientError::Transport(_) => 20,
            ClientError::HttpStatus { .. } => 21,
            ClientError::MalformedResponse(_) => 22,
            ClientError::KeyUnwrap(_) => 30,
            ClientError::AuthenticationFailure => 40,
            ClientError::Decrypt(_) => 41,
        }
    }

    /// Returns the pipeline stage this error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            ClientError::KeyGen(_) => "key generation",
            ClientError::Transport(_)
            | ClientError::HttpStatus { .. }
            | ClientError::MalformedResponse(_) => "transport",
            ClientError::KeyUnwrap(_) => "unwrap",
            ClientError::AuthenticationFailure | ClientError::Decrypt(_) => {
                "authenticated decrypt"
            }
        }
    }
}
