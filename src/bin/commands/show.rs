use super::utils::format_timestamp;
use release_scrobbler::duration::{format_duration, parse_duration};
use release_scrobbler::{LocalCatalog, ReleaseView, ScrobblerConfig};

/// Print the tracklist with side/disc layout and play counts.
pub async fn handle_show(
    catalog: &LocalCatalog,
    config: &ScrobblerConfig,
    release_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = ReleaseView::load(catalog, release_id, config.polling()).await?;
    let release = view.release();

    println!("💿 {release}");

    if view.is_multi_side() {
        let discs: Vec<String> = view.discs().iter().map(|d| d.to_string()).collect();
        println!("   Layout: {}", discs.join(", "));
    }

    let summary = view.album_play_summary();
    match summary.last_played {
        Some(last) => println!(
            "   Played {} times, last on {}",
            summary.plays,
            format_timestamp(last)
        ),
        None => println!("   Never played"),
    }
    println!();

    for (index, track) in release.tracks.iter().enumerate() {
        if !track.is_selectable() {
            println!("        ── {} ──", track.title);
            continue;
        }

        let duration = match &track.duration {
            Some(d) => format_duration(parse_duration(Some(d))),
            None => "?:??".to_string(),
        };
        let plays = match view.stats_for(index) {
            Some(stats) => format!(
                "  ▶ {}× (last {})",
                stats.count,
                format_timestamp(stats.last_played)
            ),
            None => String::new(),
        };
        let artist = match &track.artist {
            Some(artist) => format!(" – {artist}"),
            None => String::new(),
        };
        println!(
            "  [{index:2}] {:<4} {}{artist} ({duration}){plays}",
            track.position.trim(),
            track.title
        );
    }

    Ok(())
}
