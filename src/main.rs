mod backend;
mod config;
mod ui;

use backend::catalog::{Catalog, MediaId};
use backend::fetch::ContainerProbe;
use backend::playback::open_handle;
use backend::preloader::{PreloadCoordinator, PreloadError, PreloadSummary};
use backend::progress::PreloadProgress;
use config::{init_logging, TributeConfig};
use ui::ui::{ui, App, AppState};

use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, io, sync::Arc, time::Instant};
use tokio::sync::mpsc;

enum BackgroundTask {
    Progress(PreloadProgress),
    PreloadFinished(Result<PreloadSummary, PreloadError>),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = TributeConfig::load();
    init_logging(&config);

    let catalog = Catalog::from_config(&config);
    if catalog.is_empty() {
        log::warn!("No media configured, the gallery will be empty");
    }
    log::info!(
        "Starting with {} videos from {}",
        catalog.len(),
        config.media_base_url
    );

    let coordinator = Arc::new(PreloadCoordinator::new(
        catalog.assets().to_vec(),
        ContainerProbe,
        config.verify_timeout(),
    )?);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(coordinator.clone(), &config);

    // Create channel for background tasks
    let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackgroundTask>();

    spawn_preloader(coordinator, task_tx);

    let res = run_app(&mut terminal, &mut app, &mut task_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err}");
    }
    Ok(())
}

fn spawn_preloader(coordinator: Arc<PreloadCoordinator>, tx: mpsc::UnboundedSender<BackgroundTask>) {
    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let result = coordinator
            .preload_all(move |progress| {
                let _ = progress_tx.send(BackgroundTask::Progress(progress));
            })
            .await;
        let _ = tx.send(BackgroundTask::PreloadFinished(result));
    });
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    task_rx: &mut mpsc::UnboundedReceiver<BackgroundTask>,
) -> io::Result<()> {
    let mut event_stream = EventStream::new();

    loop {
        if app.tick(Instant::now()) {
            log::info!("Showing tribute ({:?})", app.reveal_reason);
        }

        terminal.draw(|f| ui(f, app))?;

        tokio::select! {
            // Redraw for the spinner, the name reveal and the loading gate
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(50)) => {}

            Some(Ok(event)) = event_stream.next() => {
                if let Event::Key(key) = event {
                    if key.kind == KeyEventKind::Press {
                        if key.code == KeyCode::Char('q') {
                            return Ok(());
                        }
                        if app.state == AppState::Ready {
                            handle_input(app, key.code);
                        }
                    }
                }
            }

            Some(task) = task_rx.recv() => {
                match task {
                    BackgroundTask::Progress(progress) => {
                        app.set_progress(progress);
                    }
                    BackgroundTask::PreloadFinished(Ok(summary)) => {
                        app.preload_finished(Some(summary));
                    }
                    BackgroundTask::PreloadFinished(Err(e)) => {
                        log::warn!("Preload did not run: {}", e);
                        app.preload_finished(None);
                    }
                }
            }
        }
    }
}

fn handle_input(app: &mut App, key: KeyCode) {
    app.status_message = None;

    if app.navigate(key) {
        return;
    }
    if key == KeyCode::Enter {
        play_selected(app);
    }
}

fn play_selected(app: &mut App) {
    let Some(media) = app.selected_media() else {
        return;
    };

    let Some(handle) = app.media.handle(&MediaId::new(media)) else {
        app.status_message = Some(format!("No video configured for {}", media));
        return;
    };

    app.status_message = Some(match open_handle(&handle) {
        Ok(_) if handle.is_local() => "Playing downloaded video".to_string(),
        Ok(_) => "Playing from source".to_string(),
        Err(e) => {
            log::warn!("Playback failed for {}: {}", media, e);
            e.to_string()
        }
    });
}
