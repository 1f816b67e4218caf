use crate::cancel::CancelReason;

/// Errors raised while driving a batch (spec §7).
///
/// Every variant that is fatal to the link carries the [`CancelReason`] that
/// becomes the process exit code once the batch coordinator unwinds to
/// `TERMINATE`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("transport I/O failed: {0}")]
    Transport(#[from] std::io::Error),

    #[error("carrier lost")]
    CarrierLost,

    #[error("framing-error count exceeded the limit")]
    TooManyFramingErrors,

    #[error("cancelled from the keyboard")]
    KeyboardCancel,

    #[error("cancelled by the remote peer")]
    RemoteCancel,

    #[error("no files were sent or received")]
    NoFiles,

    #[error("local file I/O failed for {path}: {source}")]
    LocalIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote sent a packet out of sequence for the current state")]
    ProtocolViolation,
}

impl EngineError {
    /// Maps an error to the [`CancelReason`] that should end the batch, or
    /// `None` if this error does not, by itself, terminate the link.
    #[must_use]
    pub const fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::CarrierLost => Some(CancelReason::CarrierLost),
            Self::TooManyFramingErrors => Some(CancelReason::FramingErrors),
            Self::KeyboardCancel => Some(CancelReason::Keyboard),
            Self::RemoteCancel => Some(CancelReason::Remote),
            Self::NoFiles => Some(CancelReason::NoFiles),
            Self::Transport(_) | Self::LocalIo { .. } | Self::ProtocolViolation => None,
        }
    }
}
