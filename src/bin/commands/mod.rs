pub mod plan;
pub mod show;
pub mod submit;
pub mod utils;

use clap::{Args, Subcommand};
use release_scrobbler::{LocalCatalog, ScrobblerConfig};

/// Which tracks to select and when they were played.
#[derive(Args, Clone, Debug, Default)]
pub struct SelectionArgs {
    /// Select a whole side by letter (repeatable)
    ///
    /// Usage examples:
    /// # Scrobble sides A and B
    /// release-scrobbler plan 249504 --side A --side B
    #[arg(long = "side", value_name = "LETTER")]
    pub sides: Vec<char>,

    /// Select a whole disc by number (repeatable)
    #[arg(long = "disc", value_name = "NUMBER")]
    pub discs: Vec<u32>,

    /// Select a single track by tracklist index, as printed by `show` (repeatable)
    #[arg(long = "track", value_name = "INDEX")]
    pub tracks: Vec<usize>,

    /// Explicit start time in local time, e.g. 2024-05-01T20:30
    ///
    /// Without it the tracks are timed to have just finished playing.
    #[arg(long)]
    pub start: Option<String>,

    /// Shift the start time in 5 minute steps (negative for earlier)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub nudge: i64,
}

impl SelectionArgs {
    pub fn selects_everything(&self) -> bool {
        self.sides.is_empty() && self.discs.is_empty() && self.tracks.is_empty()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a release's tracklist, side/disc layout and play counts
    ///
    /// Usage examples:
    /// release-scrobbler show 249504
    Show {
        /// Release identifier
        release_id: String,
    },

    /// Print the timestamps a selection would be scrobbled with
    ///
    /// Usage examples:
    /// # Everything, finishing now
    /// release-scrobbler plan 249504
    ///
    /// # Side B starting at a given time, as JSON
    /// release-scrobbler plan 249504 --side B --start 2024-05-01T20:30 --json
    Plan {
        release_id: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the batch as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit a selection and wait for processing to finish
    ///
    /// Usage examples:
    /// release-scrobbler submit 249504 --disc 2
    ///
    /// # Continue even if some artists have no name mapping
    /// release-scrobbler submit 249504 --yes
    Submit {
        release_id: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Continue past the unmapped artist check without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub async fn execute_command(
    command: Commands,
    catalog: &LocalCatalog,
    config: &ScrobblerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Show { release_id } => show::handle_show(catalog, config, &release_id).await,
        Commands::Plan {
            release_id,
            selection,
            json,
        } => plan::handle_plan(catalog, config, &release_id, &selection, json).await,
        Commands::Submit {
            release_id,
            selection,
            yes,
        } => submit::handle_submit(catalog, config, &release_id, &selection, yes).await,
    }
}
