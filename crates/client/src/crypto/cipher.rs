//! AES-256-GCM payload decryption with a detached authentication tag.
//!
//! The server sends the ciphertext, nonce and tag as three separate values.
//! The tag is checked before any plaintext leaves this module; on failure the
//! working buffer is zeroed and only the error is returned.

use aes_gcm::{
    aead::{
        consts::{
            U12, U13, U14, U15, U16, U17, U18, U19, U20, U21, U22, U23, U24, U25, U26, U27, U28,
            U29, U30, U31, U32, U33, U34, U35, U36, U37, U38, U39, U40, U41, U42, U43, U44, U45,
            U46, U47, U48, U49, U50, U51, U52, U53, U54, U55, U56, U57, U58, U59, U60, U61, U62,
            U63, U64,
        },
        generic_array::{typenum::Unsigned, GenericArray},
        AeadCore, AeadInPlace, KeyInit, OsRng,
    },
    aes::Aes256,
    AesGcm,
};
use common::ClientError;
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the standard GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Longest nonce accepted. Nonces other than 12 bytes are run through GHASH
/// to derive the initial counter block.
pub const MAX_NONCE_LEN: usize = 64;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Dispatch `$op::<AesGcm<Aes256, N>>(args)` on a runtime nonce length, for
/// every N from [`NONCE_LEN`] to [`MAX_NONCE_LEN`].
macro_rules! with_nonce_len {
    ($len:expr, $op:ident($($arg:expr),* $(,)?)) => {
        with_nonce_len!(@arms $len, $op ($($arg),*);
            12 => U12, 13 => U13, 14 => U14, 15 => U15, 16 => U16, 17 => U17, 18 => U18,
            19 => U19, 20 => U20, 21 => U21, 22 => U22, 23 => U23, 24 => U24, 25 => U25,
            26 => U26, 27 => U27, 28 => U28, 29 => U29, 30 => U30, 31 => U31, 32 => U32,
            33 => U33, 34 => U34, 35 => U35, 36 => U36, 37 => U37, 38 => U38, 39 => U39,
            40 => U40, 41 => U41, 42 => U42, 43 => U43, 44 => U44, 45 => U45, 46 => U46,
            47 => U47, 48 => U48, 49 => U49, 50 => U50, 51 => U51, 52 => U52, 53 => U53,
            54 => U54, 55 => U55, 56 => U56, 57 => U57, 58 => U58, 59 => U59, 60 => U60,
            61 => U61, 62 => U62, 63 => U63, 64 => U64
        )
    };
    (@arms $len:expr, $op:ident $args:tt; $($n:literal => $size:ty),+) => {
        match $len {
            $($n => $op::<AesGcm<Aes256, $size>> $args,)+
            n => Err(CipherError::InvalidNonceLength(n)),
        }
    };
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The nonce is shorter than [`NONCE_LEN`] or longer than [`MAX_NONCE_LEN`].
    #[error("unsupported iv length: {0} bytes (expected {NONCE_LEN}..={MAX_NONCE_LEN})")]
    InvalidNonceLength(usize),

    /// The tag is the wrong length (must be [`TAG_LEN`] bytes).
    #[error("invalid tag length: expected {TAG_LEN} bytes, got {0}")]
    InvalidTagLength(usize),

    /// The tag did not validate.
    #[error("authentication tag mismatch")]
    AuthenticationFailure,

    /// The plaintext is beyond the GCM length limit.
    #[error("plaintext too long for AES-GCM")]
    PlaintextTooLong,
}

impl From<CipherError> for ClientError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::AuthenticationFailure => ClientError::AuthenticationFailure,
            other => ClientError::Decrypt(other.to_string()),
        }
    }
}

/// Output of [`seal_payload`]: ciphertext with its detached tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// Ciphertext, same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// GCM authentication tag.
    pub tag: [u8; TAG_LEN],
}

/// Decrypt `ciphertext` and verify `tag` under `key` and `iv`, with empty
/// associated data.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`], [`CipherError::InvalidNonceLength`]
/// or [`CipherError::InvalidTagLength`] for malformed inputs, and
/// [`CipherError::AuthenticationFailure`] if the tag does not validate. No
/// plaintext is returned in any error case.
pub fn decrypt_payload(
    ciphertext: &[u8],
    iv: &[u8],
    tag: &[u8],
    key: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if tag.len() != TAG_LEN {
        return Err(CipherError::InvalidTagLength(tag.len()));
    }

    let mut buffer = ciphertext.to_vec();
    let outcome = with_nonce_len!(iv.len(), open(key, iv, tag, &mut buffer));

    match outcome {
        Ok(()) => Ok(buffer),
        Err(e) => {
            buffer.iter_mut().for_each(|b| *b = 0);
            Err(e)
        }
    }
}

/// Encrypt `plaintext` under `key` and `iv`, returning the ciphertext and the
/// detached tag. Accepts the same nonce lengths as [`decrypt_payload`].
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] or [`CipherError::InvalidNonceLength`]
/// for malformed inputs.
pub fn seal_payload(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<SealedPayload, CipherError> {
    let mut buffer = plaintext.to_vec();
    let tag = with_nonce_len!(iv.len(), seal(key, iv, &mut buffer))?;
    Ok(SealedPayload {
        ciphertext: buffer,
        tag,
    })
}

/// Generate a random 96-bit nonce via the OS CSPRNG.
pub fn generate_iv() -> [u8; NONCE_LEN] {
    use aes_gcm::aead::rand_core::RngCore;
    let mut iv = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

fn open<C>(key: &[u8], iv: &[u8], tag: &[u8], buffer: &mut [u8]) -> Result<(), CipherError>
where
    C: KeyInit + AeadInPlace + AeadCore<TagSize = U16>,
{
    let cipher = build_cipher::<C>(key, iv)?;
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(iv),
            &[],
            buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CipherError::AuthenticationFailure)
}

fn seal<C>(key: &[u8], iv: &[u8], buffer: &mut [u8]) -> Result<[u8; TAG_LEN], CipherError>
where
    C: KeyInit + AeadInPlace + AeadCore<TagSize = U16>,
{
    let cipher = build_cipher::<C>(key, iv)?;
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(iv), &[], buffer)
        .map_err(|_| CipherError::PlaintextTooLong)?;
    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(&tag);
    Ok(out)
}

fn build_cipher<C: KeyInit + AeadCore>(key: &[u8], iv: &[u8]) -> Result<C, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength(key.len()));
    }
    if iv.len() != <<C as AeadCore>::NonceSize as Unsigned>::USIZE {
        return Err(CipherError::InvalidNonceLength(iv.len()));
    }
    C::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength(key.len()))
}
