//! Error types for the protocol layer.
//!
//! Every variant here means "this datagram could not be understood".
//! The host drops such a message, logs it and keeps serving; none of
//! these errors ever tear down the engine.

/// Errors that can occur while encoding or decoding a wire message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The bytes are not valid UTF-16LE text (odd length or an unpaired
    /// surrogate).
    #[error("invalid UTF-16 payload: {0}")]
    InvalidUtf16(String),

    /// Field 0 is not an integer, or a numeric field failed to parse.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Field 0 parsed, but no message uses that signifier.
    #[error("unknown signifier {0}")]
    UnknownSignifier(u32),

    /// The signifier is known but the message has the wrong number of
    /// fields after it.
    #[error("signifier {signifier} expects {expected} field(s), got {got}")]
    FieldCount {
        signifier: u32,
        expected: usize,
        got: usize,
    },

    /// A field value contains the separator or a line break and cannot
    /// be sent without corrupting the frame.
    #[error("field {0:?} contains a comma or line break and cannot be encoded")]
    UnencodableField(String),
}
