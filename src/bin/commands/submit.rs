use super::utils::load_view;
use super::SelectionArgs;
use release_scrobbler::{
    LocalCatalog, ScrobbleEvent, ScrobbleEventReceiver, ScrobblerConfig, ScrobblerError,
    SubmitRequest,
};
use tokio::sync::broadcast::error::RecvError;

/// Run the disambiguation check and submit the selection.
pub async fn handle_submit(
    catalog: &LocalCatalog,
    config: &ScrobblerConfig,
    release_id: &str,
    args: &SelectionArgs,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut view = load_view(catalog, config, release_id, args).await?;

    println!(
        "📤 Scrobbling {} tracks from {}",
        view.selection().len(),
        view.release()
    );

    let orchestrator = view.orchestrator();
    let mut events = orchestrator.subscribe();

    let submission = async {
        let progress = match view.submit(catalog).await? {
            SubmitRequest::Submitted(progress) => progress,
            SubmitRequest::AwaitingConfirmation(artists) => {
                println!("⚠️  These artists have a disambiguation suffix and no name mapping:");
                for artist in &artists {
                    println!("    - {artist}");
                }
                if !yes {
                    view.cancel_confirmation();
                    println!(
                        "   Add a mapping to the config, or re-run with --yes to continue anyway."
                    );
                    return Ok(None);
                }
                view.confirm_submission(catalog).await?
            }
        };
        Ok::<_, ScrobblerError>(Some(progress))
    };

    let result = tokio::select! {
        result = submission => result,
        () = follow_events(&mut events) => Ok(None),
    };
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }

    if let Some(progress) = result? {
        println!("✅ Done: {progress}");
        if progress.ignored > 0 || progress.failed > 0 {
            println!("   Some scrobbles were not accepted (too old or rejected by the service)");
        }
    }
    Ok(())
}

async fn follow_events(events: &mut ScrobbleEventReceiver) {
    loop {
        match events.recv().await {
            Ok(event) => print_event(&event),
            Err(RecvError::Lagged(skipped)) => log::debug!("Skipped {skipped} events"),
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

fn print_event(event: &ScrobbleEvent) {
    match event {
        ScrobbleEvent::SessionCreated { session_id, .. } => {
            println!("   Session {session_id} created");
        }
        ScrobbleEvent::Progress { progress, .. } => println!("   ⏳ {progress}"),
        ScrobbleEvent::Failed { message, .. } => println!("   ❌ {message}"),
        ScrobbleEvent::Cancelled { .. } => println!("   Cancelled"),
        ScrobbleEvent::SubmissionStarted { .. } | ScrobbleEvent::Completed { .. } => {}
    }
}
