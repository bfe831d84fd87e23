mod common;

use chrono::Utc;
use common::{double_lp, write_catalog};
use release_scrobbler::{
    LocalCatalog, ReleaseView, ScrobblerConfig, ScrobblerError, SubmissionState, SubmitRequest,
};
use std::fs;

const HISTORY: &str = r#"[
    {"artist": "Boris", "album": "Amplifier Worship", "track": "HAMA", "timestamp": 1000},
    {"artist": "boris", "album": "Amplifier Worship", "track": "Hama!", "timestamp": 3000},
    {"artist": "Boris", "album": "Amplifier Worship", "track": "Ganbou Shi", "timestamp": 2000},
    {"artist": "Boris", "album": "Amplifier Worship", "timestamp": 4000},
    {"artist": "Boris", "album": "Pink", "track": "Huge", "timestamp": 5000}
]"#;

fn catalog_config(dir: &std::path::Path, mappings: &str) -> ScrobblerConfig {
    let config_path = dir.join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{
                "data_dir": {data_dir:?},
                "poll_interval_ms": 1,
                "initial_poll_delay_ms": 1,
                "artist_mappings": {mappings}
            }}"#,
            data_dir = dir.display().to_string()
        ),
    )
    .unwrap();
    ScrobblerConfig::from_file(&config_path).unwrap()
}

async fn load(mappings: &str) -> (tempfile::TempDir, LocalCatalog, ReleaseView) {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path(), &double_lp(), HISTORY);
    let config = catalog_config(dir.path(), mappings);
    let catalog = LocalCatalog::from_config(&config);
    let view = ReleaseView::load(&catalog, "249504", config.polling())
        .await
        .unwrap();
    (dir, catalog, view)
}

#[test_log::test(tokio::test)]
async fn test_load_builds_topology_selection_and_history() {
    let (_dir, _catalog, view) = load("{}").await;

    assert!(view.is_multi_side());
    assert_eq!(view.topology().sides, vec!['A', 'B', 'C', 'D']);
    assert_eq!(view.discs().len(), 2);
    assert_eq!(view.selection().len(), 6);
    assert!(view.is_disc_selected(1) && view.is_disc_selected(2));

    // History is looked up without the catalog's disambiguation suffix.
    let hama = view.stats_for(1).unwrap();
    assert_eq!((hama.count, hama.last_played), (2, 3000));
    assert_eq!(view.stats_for(2).unwrap().count, 1);
    assert!(view.stats_for(3).is_none());
    assert!(view.stats_for(0).is_none());

    let summary = view.album_play_summary();
    assert_eq!(summary.plays, 4);
    assert_eq!(summary.last_played, Some(4000));
}

#[tokio::test]
async fn test_unknown_release_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = LocalCatalog::new(dir.path(), Default::default());
    let result = ReleaseView::load(&catalog, "nope", Default::default()).await;
    assert!(matches!(result, Err(ScrobblerError::NotFound(_))));
}

#[test_log::test(tokio::test)]
async fn test_mapped_artists_submit_without_pause() {
    let (_dir, catalog, mut view) =
        load(r#"{"Boris (2)": "Boris", "Sunn O))) (3)": "Sunn O)))"}"#).await;

    let result = view.submit(&catalog).await.unwrap();
    let SubmitRequest::Submitted(progress) = result else {
        panic!("expected immediate submission, got {result:?}");
    };
    assert_eq!(progress.total, 6);
    assert_eq!(progress.success, 6);
    assert_eq!(progress.ignored, 0);
    assert!(matches!(
        view.submission_state(),
        SubmissionState::Completed { .. }
    ));
}

#[test_log::test(tokio::test)]
async fn test_unmapped_artist_pauses_until_confirmed() {
    let (_dir, catalog, mut view) = load(r#"{"Boris (2)": "Boris"}"#).await;

    let result = view.submit(&catalog).await.unwrap();
    assert_eq!(
        result,
        SubmitRequest::AwaitingConfirmation(vec!["Sunn O))) (3)".to_string()])
    );
    assert_eq!(
        view.pending_confirmation(),
        Some(&["Sunn O))) (3)".to_string()][..])
    );
    assert_eq!(view.submission_state(), SubmissionState::Idle);

    let progress = view.confirm_submission(&catalog).await.unwrap();
    assert_eq!(progress.success, 6);
    assert!(view.pending_confirmation().is_none());

    assert!(matches!(
        view.confirm_submission(&catalog).await,
        Err(ScrobblerError::NoPendingConfirmation)
    ));
}

#[tokio::test]
async fn test_deselecting_flagged_artist_skips_guard() {
    let (_dir, catalog, mut view) = load(r#"{"Boris (2)": "Boris"}"#).await;

    view.toggle_side('D');
    assert!(!view.is_disc_selected(2));
    assert!(view.is_side_selected('C'));

    let result = view.submit(&catalog).await.unwrap();
    assert!(matches!(result, SubmitRequest::Submitted(p) if p.total == 5));
}

#[tokio::test]
async fn test_self_mapping_still_needs_confirmation() {
    let (_dir, catalog, mut view) =
        load(r#"{"Boris (2)": "Boris (2)", "Sunn O))) (3)": "Sunn O)))"}"#).await;

    let result = view.submit(&catalog).await.unwrap();
    assert_eq!(
        result,
        SubmitRequest::AwaitingConfirmation(vec!["Boris (2)".to_string()])
    );

    view.cancel_confirmation();
    assert!(view.pending_confirmation().is_none());
    assert!(matches!(
        view.confirm_submission(&catalog).await,
        Err(ScrobblerError::NoPendingConfirmation)
    ));
}

#[test_log::test(tokio::test)]
async fn test_old_explicit_start_is_ignored_by_service() {
    let (_dir, catalog, mut view) =
        load(r#"{"Boris (2)": "Boris", "Sunn O))) (3)": "Sunn O)))"}"#).await;

    view.set_start(Some(Utc::now().timestamp() - 30 * 24 * 3600));
    let SubmitRequest::Submitted(progress) = view.submit(&catalog).await.unwrap() else {
        panic!("expected submission");
    };
    assert_eq!(progress.ignored, 6);
    assert_eq!(progress.success, 0);
    assert_eq!(progress.to_string(), "6/6 processed (0 scrobbled, 6 ignored, 0 failed)");
}

#[tokio::test]
async fn test_empty_selection_cannot_be_submitted() {
    let (_dir, catalog, mut view) = load("{}").await;

    view.toggle_all();
    assert!(view.selection().is_empty());
    assert!(view.timing_display(Utc::now().timestamp()).is_none());
    assert!(view.preview_batch(Utc::now().timestamp()).is_none());
    assert!(matches!(
        view.submit(&catalog).await,
        Err(ScrobblerError::NothingSelected)
    ));
}

#[tokio::test]
async fn test_preview_batch_uses_ascending_order_and_gaps() {
    let (_dir, _catalog, mut view) = load("{}").await;

    view.toggle_all();
    view.toggle_track(3);
    view.toggle_track(2);
    view.set_start(Some(1_700_000_000));

    let batch = view.preview_batch(0).unwrap();
    let timestamps: Vec<i64> = batch.entries.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![1_700_000_000, 1_700_000_211]);
    assert_eq!(batch.entries[0].track, "Ganbou-Shi");
    assert_eq!(batch.entries[0].artist, "Boris (2)");
    assert_eq!(view.selected_duration(), 452);

    view.set_start(None);
    let now = 1_700_010_000;
    let batch = view.preview_batch(now).unwrap();
    assert_eq!(batch.first_timestamp(), Some(now - 452));
}
