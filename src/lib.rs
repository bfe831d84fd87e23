pub mod backend;
pub mod cancel;
pub mod config;
pub mod duration;
pub mod error;
pub mod events;
pub mod guard;
pub mod history;
pub mod local;
pub mod orchestrator;
pub mod selection;
pub mod timing;
pub mod topology;
pub mod types;
pub mod view;

pub use backend::ScrobbleBackend;
#[cfg(feature = "mock")]
pub use backend::MockScrobbleBackend;
pub use config::ScrobblerConfig;
pub use error::ScrobblerError;
pub use events::{ScrobbleEvent, ScrobbleEventReceiver, SharedEventBroadcaster};
pub use guard::GuardOutcome;
pub use history::{normalize_title, HistoryIndex, TrackScrobbleStats};
pub use local::LocalCatalog;
pub use orchestrator::{PollSettings, ScrobbleOrchestrator, SubmissionState};
pub use selection::Selection;
pub use timing::TimingPlan;
pub use topology::{Disc, SideTopology};
pub use types::{
    AlbumHistory, ArtistMapping, HistoryPlay, Release, ReleaseContext, ReleaseTrack,
    ScrobbleBatch, ScrobbleEntry, ScrobbleProgress, SessionStatus, SessionStatusResponse,
    SubmitResponse, TrackDuration,
};
pub use view::{ReleaseView, SubmitRequest};

pub type Result<T> = std::result::Result<T, ScrobblerError>;
