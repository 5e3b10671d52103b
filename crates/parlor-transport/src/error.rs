/// Errors that can occur in the transport layer.
///
/// None of these are fatal to the server: a failed connection is reported
/// to the engine as a disconnect and everyone else keeps playing.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data to a peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data from a peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or completing a WebSocket upgrade failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
