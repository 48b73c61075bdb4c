//! Hybrid-decryption primitives: RSA-OAEP key unwrap and AES-256-GCM payload
//! decryption.
//!
//! This module is intentionally free of HTTP dependencies. The counterpart
//! operations ([`identity::wrap_key`], [`cipher::seal_payload`]) are exposed
//! so that the server side of the scheme can be reproduced in tests.

pub mod cipher;
pub mod identity;
pub mod key;

pub use cipher::{decrypt_payload, KEY_LEN};
pub use identity::{Identity, RSA_KEY_BITS};
pub use key::SymmetricKey;
