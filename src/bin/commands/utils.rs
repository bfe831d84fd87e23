use super::SelectionArgs;
use chrono::Local;
use release_scrobbler::timing::{format_local_datetime, parse_local_datetime};
use release_scrobbler::{LocalCatalog, ReleaseView, ScrobblerConfig};

/// Load a release view from the local catalog and apply the requested selection/timing.
pub async fn load_view(
    catalog: &LocalCatalog,
    config: &ScrobblerConfig,
    release_id: &str,
    args: &SelectionArgs,
) -> Result<ReleaseView, Box<dyn std::error::Error>> {
    let mut view = ReleaseView::load(catalog, release_id, config.polling()).await?;
    apply_selection(&mut view, args)?;
    Ok(view)
}

/// Start from everything, or from nothing plus the requested sides/discs/tracks.
pub fn apply_selection(
    view: &mut ReleaseView,
    args: &SelectionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if !args.selects_everything() {
        // A partial selection first toggles to "all", then to empty.
        while !view.selection().is_empty() {
            view.toggle_all();
        }
        for &side in &args.sides {
            let side = side.to_ascii_uppercase();
            if !view.topology().sides.contains(&side) {
                return Err(format!("Release has no side {side}").into());
            }
            if !view.is_side_selected(side) {
                view.toggle_side(side);
            }
        }
        for &disc in &args.discs {
            if view.topology().disc(disc).is_none() {
                return Err(format!("Release has no disc {disc}").into());
            }
            if !view.is_disc_selected(disc) {
                view.toggle_disc(disc);
            }
        }
        for &index in &args.tracks {
            if view.selection().contains(index) {
                continue;
            }
            if !view.toggle_track(index) {
                return Err(format!("Tracklist entry {index} is not a selectable track").into());
            }
        }
    }

    if let Some(start) = &args.start {
        let timestamp = parse_local_datetime(start, &Local).ok_or_else(|| {
            format!("Unrecognized start time {start:?}, expected YYYY-MM-DDTHH:MM")
        })?;
        view.set_start(Some(timestamp));
    }
    if args.nudge != 0 {
        view.nudge_start(args.nudge);
    }
    Ok(())
}

/// Format a unix timestamp in local time.
pub fn format_timestamp(timestamp: i64) -> String {
    format_local_datetime(timestamp, &Local)
}
