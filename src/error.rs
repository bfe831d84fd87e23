use thiserror::Error;

/// Error types for release scrobbling operations.
///
/// Malformed durations and position labels never show up here: they are
/// absorbed with fallbacks where they are parsed. A missing album history or
/// artist mapping is an empty state, not an error. What remains are transport
/// failures, backend-reported session failures, and misuse of the
/// submission flow.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use release_scrobbler::{LocalCatalog, ReleaseView, ScrobblerConfig, ScrobblerError, SubmitRequest};
///
/// # tokio_test::block_on(async {
/// let config = ScrobblerConfig::load()?;
/// let catalog = LocalCatalog::from_config(&config);
/// let mut view = ReleaseView::load(&catalog, "249504", config.polling()).await?;
///
/// match view.submit(&catalog).await {
///     Ok(SubmitRequest::Submitted(progress)) => println!("Done: {progress}"),
///     Ok(SubmitRequest::AwaitingConfirmation(artists)) => {
///         println!("No mapping for: {}", artists.join(", "));
///     }
///     Err(ScrobblerError::SessionFailed { message, .. }) => eprintln!("Backend failed: {message}"),
///     Err(e) => eprintln!("Submission failed: {e}"),
/// }
/// # Ok::<(), ScrobblerError>(())
/// # });
/// ```
#[derive(Error, Debug)]
pub enum ScrobblerError {
    /// Transport failure while talking to a collaborator.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A collaborator returned a payload that could not be understood.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The requested release or session does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend accepted the batch but reported the session as failed.
    #[error("Scrobble session {session_id} failed: {message}")]
    SessionFailed {
        /// Server-assigned session handle
        session_id: String,
        /// Reason reported by the backend
        message: String,
    },

    /// A submission for this release is already being submitted or polled.
    #[error("A scrobble submission is already in progress")]
    AlreadyInFlight,

    /// Submission was attempted with no tracks selected.
    #[error("No tracks selected")]
    NothingSelected,

    /// Confirmation was given while no disambiguation check was pending.
    #[error("No submission is awaiting confirmation")]
    NoPendingConfirmation,

    /// The polling scope was invalidated, e.g. after navigating away.
    #[error("Submission cancelled")]
    Cancelled,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
