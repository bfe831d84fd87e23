use super::utils::{format_timestamp, load_view};
use super::SelectionArgs;
use chrono::Utc;
use release_scrobbler::duration::format_duration;
use release_scrobbler::{LocalCatalog, ScrobblerConfig};

/// Print the batch a selection would produce right now.
pub async fn handle_plan(
    catalog: &LocalCatalog,
    config: &ScrobblerConfig,
    release_id: &str,
    args: &SelectionArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = load_view(catalog, config, release_id, args).await?;
    let now = Utc::now().timestamp();

    let Some(batch) = view.preview_batch(now) else {
        println!("⚠️  No tracks selected");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
        return Ok(());
    }

    println!("💿 {}", view.release());
    if let Some(timing) = view.timing_display(now) {
        println!("⏱️  {timing}");
    }
    println!(
        "   {} tracks, {} total\n",
        batch.len(),
        format_duration(view.selected_duration())
    );

    for entry in &batch.entries {
        println!(
            "  {}  {:<4} {} ({})",
            format_timestamp(entry.timestamp),
            entry.position,
            entry,
            format_duration(entry.duration)
        );
    }

    Ok(())
}
