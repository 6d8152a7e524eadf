//! TUI front-end entry (Ratatui + Crossterm)
//! - Builds the API client over the stored session
//! - Sets up the terminal and restores it on exit

use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::api::ApiClient;
use crate::config::Config;
use crate::session::FileSessionStore;

pub mod input;
pub mod state;
pub mod ui;
pub mod util;

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let mut out = stdout();
                let _ = execute!(out, LeaveAlternateScreen, DisableMouseCapture);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

pub async fn run(config: &Config) -> Result<()> {
    let mut app = init_app(config)?;
    let mut session = TerminalSession::new()?;

    // first paint before the initial fetch so the user sees something
    session.terminal.draw(|f| ui::draw(f, &mut app))?;
    app.start().await;

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        session.terminal.draw(|f| ui::draw(f, &mut app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key).await?;
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.quit {
            break;
        }
    }

    Ok(())
}

pub fn init_app(config: &Config) -> Result<state::App> {
    let store = Arc::new(FileSessionStore::new(&config.session_file));
    let api = ApiClient::from_config(config, store)?;
    tracing::info!(api = %api.base_url(), authenticated = api.is_authenticated(), "starting TUI");
    Ok(state::App::new(api))
}
