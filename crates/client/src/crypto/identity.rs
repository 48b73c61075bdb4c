//! Ephemeral RSA identity: key generation, public key export, and RSA-OAEP
//! key unwrap.
//!
//! The wrap scheme is fixed to RSA-OAEP with SHA-256 for both the label hash
//! and MGF1. A key wrapped under any other padding or hash is rejected.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::ClientError;
use rand::rngs::OsRng;
use rsa::{
    pkcs8::{DecodePublicKey, EncodePublicKey},
    traits::PublicKeyParts,
    Oaep, RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;
use thiserror::Error;

use super::cipher::KEY_LEN;
use super::key::SymmetricKey;

/// RSA modulus length for the per-run key pair.
pub const RSA_KEY_BITS: usize = 2048;

/// Errors produced by the RSA layer.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The RSA primitive could not produce a key pair.
    #[error("RSA key generation failed: {0}")]
    Generation(String),

    /// The public key could not be encoded as DER SubjectPublicKeyInfo.
    #[error("public key export failed: {0}")]
    Export(String),

    /// The public key could not be decoded from base64 DER SubjectPublicKeyInfo.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// RSA-OAEP encryption of a key failed.
    #[error("RSA-OAEP wrap failed: {0}")]
    Wrap(String),

    /// RSA-OAEP decryption failed (wrong key, padding, hash, or corrupt data).
    #[error("RSA-OAEP decryption failed: {0}")]
    Unwrap(String),

    /// The unwrapped key is not an AES-256 key.
    #[error("unwrapped key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),
}

impl From<IdentityError> for ClientError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Generation(_) | IdentityError::Export(_) => {
                ClientError::KeyGen(e.to_string())
            }
            IdentityError::InvalidPublicKey(_)
            | IdentityError::Wrap(_)
            | IdentityError::Unwrap(_)
            | IdentityError::InvalidKeyLength(_) => ClientError::KeyUnwrap(e.to_string()),
        }
    }
}

/// The client's RSA key pair for one run.
pub struct Identity {
    private_key: RsaPrivateKey,
}

impl Identity {
    /// Generate a fresh [`RSA_KEY_BITS`]-bit key pair via the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Generation`] if the primitive fails.
    pub fn generate() -> Result<Self, IdentityError> {
        Self::with_modulus_bits(RSA_KEY_BITS)
    }

    pub(crate) fn with_modulus_bits(bits: usize) -> Result<Self, IdentityError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| IdentityError::Generation(e.to_string()))?;
        Ok(Self { private_key })
    }

    /// The public half of the key pair.
    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }

    /// Modulus length in bits.
    pub fn modulus_bits(&self) -> usize {
        self.private_key.size() * 8
    }

    /// Export the public key as base64 DER SubjectPublicKeyInfo, the format
    /// sent in the `X-Public-Key` request header.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Export`] if DER encoding fails.
    pub fn public_key_b64(&self) -> Result<String, IdentityError> {
        let der = self
            .public_key()
            .to_public_key_der()
            .map_err(|e| IdentityError::Export(e.to_string()))?;
        Ok(BASE64.encode(der.as_bytes()))
    }

    /// Decrypt a wrapped AES key with RSA-OAEP(SHA-256).
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Unwrap`] if OAEP decoding fails and
    /// [`IdentityError::InvalidKeyLength`] if the recovered key is not
    /// [`KEY_LEN`] bytes.
    pub fn unwrap_key(&self, wrapped_key: &[u8]) -> Result<SymmetricKey, IdentityError> {
        let mut raw = self
            .private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped_key)
            .map_err(|e| IdentityError::Unwrap(e.to_string()))?;

        let key = SymmetricKey::from_slice(&raw);
        let len = raw.len();
        raw.iter_mut().for_each(|b| *b = 0);
        key.ok_or(IdentityError::InvalidKeyLength(len))
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

/// Encrypt `key` under `public_key` with RSA-OAEP(SHA-256).
///
/// # Errors
///
/// Returns [`IdentityError::Wrap`] if `key` is too long for the modulus.
pub fn wrap_key(public_key: &RsaPublicKey, key: &[u8]) -> Result<Vec<u8>, IdentityError> {
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key)
        .map_err(|e| IdentityError::Wrap(e.to_string()))
}

/// Decode a base64 DER SubjectPublicKeyInfo, as found in the `X-Public-Key`
/// request header.
///
/// # Errors
///
/// Returns [`IdentityError::InvalidPublicKey`] on bad base64 or DER.
pub fn decode_public_key(b64: &str) -> Result<RsaPublicKey, IdentityError> {
    let der = BASE64
        .decode(b64)
        .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
    RsaPublicKey::from_public_key_der(&der).map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))
}
