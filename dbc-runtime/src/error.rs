//! Runtime error kinds, wrapping the lower crates' errors the way
//! `fuel-vm`'s `InterpreterError` wraps `CheckError` and storage errors.

/// Errors raised while encoding, decoding, or driving a device session.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// No message with this name exists on the device.
    #[error("unknown message `{0}`")]
    UnknownMessage(String),
    /// No setting with this name exists on the device.
    #[error("unknown setting `{0}`")]
    UnknownSetting(String),
    /// Packing a message or setting payload failed.
    #[error(transparent)]
    Codec(#[from] dbc_asm::CodecError),
    /// The transport reported a failure while waiting for a response.
    #[error("transport error: {0}")]
    Transport(String),
    /// A blocking request timed out waiting for a matching response.
    #[error("timed out waiting for a response to `{0}`")]
    Timeout(String),
}
