//! Test client for a hybrid-encryption endpoint.
//!
//! One run generates an RSA-2048 key pair, presents the public key to the
//! server, unwraps the returned AES-256 key with RSA-OAEP(SHA-256), and
//! decrypts the AES-256-GCM payload.

pub mod config;
pub mod crypto;
pub mod pipeline;
pub mod telemetry;
pub mod transport;

pub use pipeline::{HybridUnwrapClient, Stage};
