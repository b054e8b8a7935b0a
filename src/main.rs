mod api;
mod app;
mod config;
mod events;
mod fetch;
mod format;
mod memo;
mod models;
mod settings;
mod ui;

use anyhow::Result;
use api::indexer::IndexerClient;
use app::App;
use clap::Parser;
use config::Config;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use events::EventAction;
use fetch::FetchPlan;
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::Settings;
use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    config.init_logging()?;

    let settings = Settings::load(&config.settings_path());
    let client = IndexerClient::new(&config.indexer_url, config.chain_id);
    tracing::info!(
        indexer = %config.indexer_url,
        chain_id = config.chain_id,
        mode = ?config.mode,
        positions = config.positions_enabled(),
        "starting lendtop"
    );

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let app = Arc::new(Mutex::new(App::new(&config, settings)));
    spawn_fetch_task(app.clone(), client.clone());

    let result = run(&mut terminal, app, client).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{:#}", e), "exited with error");
    }
    result
}

async fn run(terminal: &mut Term, app: Arc<Mutex<App>>, client: IndexerClient) -> Result<()> {
    let started = Instant::now();
    loop {
        {
            let mut app_lock = app.lock().await;
            // Fire debounced recomputes that came due since the last frame.
            app_lock.timers.advance_to(started.elapsed());
            app_lock.update_animation_frame();
            app_lock.refresh_derived();
            if app_lock.take_redraw() || app_lock.loading {
                terminal.draw(|f| ui::render(f, &app_lock))?;
            }
        }

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let action = {
                        let mut app_lock = app.lock().await;
                        events::handle_key_event(&mut app_lock, key)
                    };
                    match action {
                        EventAction::Refresh => spawn_fetch_task(app.clone(), client.clone()),
                        EventAction::Quit => break,
                        EventAction::None => {}
                    }
                }
                Event::Resize(_, _) => app.lock().await.request_redraw(),
                _ => {}
            }
        }
    }
    Ok(())
}

fn spawn_fetch_task(app: Arc<Mutex<App>>, client: IndexerClient) {
    tokio::spawn(async move {
        let (vaults, wallet) = {
            let mut app_lock = app.lock().await;
            if app_lock.loading {
                return;
            }
            app_lock.start_fetch();
            let plan = app_lock.fetch_plan();
            (plan.vaults, plan.wallet.map(str::to_string))
        };

        let plan = FetchPlan {
            vaults,
            wallet: wallet.as_deref(),
        };
        let outcome = fetch::fetch_data(&client, plan).await;
        app.lock().await.finish_fetch(outcome);
    });
}
