//! Transport-level errors at the API boundary.

/// All errors a `HotelApi` implementation can return.
///
/// Transport failures are recovered locally by the polling cadence or the
/// reconnect backoff; they surface to a user only when a user-initiated
/// mutation fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Network-level failure (connection refused, timeout, reset).
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The server actively refused a request.
    #[error("request rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The push channel closed. No messages are buffered across a
    /// disconnect; the caller must resynchronize with a full fetch after
    /// reconnecting.
    #[error("push channel closed")]
    ChannelClosed,

    /// The server returned a body that could not be decoded.
    #[error("undecodable response: {message}")]
    Decode { message: String },
}
