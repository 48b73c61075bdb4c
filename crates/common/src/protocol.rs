//! Wire contract of the hybrid-encryption test endpoint.
//!
//! The client sends its public key in a request header; the server answers
//! with the ciphertext in a JSON body and the remaining envelope parts in
//! response headers. Every binary value travels as standard base64.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Header names
// ---------------------------------------------------------------------------

/// Request header carrying the base64 DER SubjectPublicKeyInfo.
pub const PUBLIC_KEY_HEADER: &str = "X-Public-Key";

/// Response header carrying the base64 AES-GCM nonce.
pub const IV_HEADER: &str = "X-Requested-IV";

/// Response header carrying the base64 AES-GCM authentication tag.
pub const TAG_HEADER: &str = "X-Requested-Tag";

/// Response header carrying the base64 RSA-OAEP wrapped AES key.
pub const WRAPPED_KEY_HEADER: &str = "X-Requested-Encryption-Key";

// ---------------------------------------------------------------------------
// Encrypt endpoint
// ---------------------------------------------------------------------------

/// Response body for `GET /api/test/encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponseBody {
    /// Base64 AES-256-GCM ciphertext, tag detached.
    pub data: String,
}

/// A decoded server response, ready for key unwrap and payload decryption.
///
/// All fields hold raw bytes; base64 decoding happens when the response is
/// received.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// AES-256-GCM ciphertext without the tag.
    pub ciphertext: Vec<u8>,
    /// GCM nonce.
    pub iv: Vec<u8>,
    /// GCM authentication tag.
    pub auth_tag: Vec<u8>,
    /// AES key encrypted under the client's RSA public key.
    pub wrapped_key: Vec<u8>,
}

impl std::fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedEnvelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv_len", &self.iv.len())
            .field("auth_tag_len", &self.auth_tag.len())
            .field("wrapped_key_len", &self.wrapped_key.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_parses_data_field() {
        let body: EncryptResponseBody =
            serde_json::from_str(r#"{"data":"aGVsbG8=","extra":1}"#).unwrap();
        assert_eq!(body.data, "aGVsbG8=");
    }

    #[test]
    fn body_without_data_is_rejected() {
        assert!(serde_json::from_str::<EncryptResponseBody>(r#"{"payload":"x"}"#).is_err());
    }

    #[test]
    fn envelope_debug_shows_lengths_only() {
        let env = EncryptedEnvelope {
            ciphertext: vec![0xAB; 5],
            iv: vec![0; 12],
            auth_tag: vec![0; 16],
            wrapped_key: vec![0; 256],
        };
        let s = format!("{env:?}");
        assert!(s.contains("wrapped_key_len: 256"));
        assert!(!s.contains("171"));
    }
}
