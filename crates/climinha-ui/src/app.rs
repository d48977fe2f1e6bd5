//! Application lifecycle: start tracking, react to input, tear down.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app_services::AppServices;
use crate::models::AppState;
use crate::services::Command;

/// Run until `Command::Quit` or the command channel closes.
///
/// `render` is called with every distinct state. Returns the last state.
pub async fn run<R>(
    services: AppServices,
    mut commands: mpsc::Receiver<Command>,
    mut render: R,
) -> AppState
where
    R: FnMut(&AppState),
{
    let AppServices {
        service,
        tracker,
        mut events,
        watch,
    } = services;

    let mut last_drawn: Option<AppState> = None;
    let mut draw = |state: AppState| {
        if last_drawn.as_ref() != Some(&state) {
            render(&state);
            last_drawn = Some(state);
        }
    };

    draw(service.snapshot());

    if let Err(e) = tracker.initialize().await {
        service.report_location_error(&e);
    }
    let mut subscription = tracker.subscribe(watch);

    let mut fetch_statuses = service.subscribe_fetch_status();
    let mut changes = service.store().subscribe();
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        draw(service.snapshot());

        tokio::select! {
            Some(event) = events.recv() => service.apply(event),
            command = commands.recv() => match command {
                Some(Command::FetchWeather) => {
                    if let Some(handle) = service.request_fetch() {
                        in_flight = Some(handle);
                    }
                }
                Some(Command::Quit) | None => break,
            },
            Ok(()) = fetch_statuses.changed() => {}
            Ok(()) = changes.changed() => {}
        }
    }

    tracing::info!("Shutting down");
    subscription.cancel();
    if let Some(handle) = in_flight {
        handle.abort();
    }

    let last = service.snapshot();
    draw(last.clone());
    last
}
