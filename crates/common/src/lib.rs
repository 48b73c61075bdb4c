//! Error taxonomy and wire protocol definitions shared across `hybrid-unwrap` crates.

pub mod error;
pub mod protocol;

pub use error::ClientError;
pub use protocol::EncryptedEnvelope;
