//! Terminal User Interface Module
//!
//! Interactive chat over the complaint index, built with Ratatui.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  🛡️ CrediTrust Consumer Intelligence Bot       LLM ● Index ●   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─ Progress ──────────────────────────────────────────────┐   │
//! │  │ ● Retrieving → ○ Generating → ○ Done                     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │  ┌─ Conversation ──────────────────────────────────────────┐   │
//! │  │  [Answers followed by the complaint excerpts they cite]  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │  ┌─ Question ──────────────────────────────────────────────┐   │
//! │  │ > Ask about consumer complaints...                       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │  [Enter] Ask | [Tab] Examples | [Ctrl+Q] Quit | [F1] Help      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, AppEvent, PipelineStage, View};
pub use event::{AppAction, EventHandler};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use tracing::{error, info};

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI application
pub async fn run(config: crate::config::Config) -> anyhow::Result<()> {
    info!("Starting TUI mode");

    let mut app = App::new(config);
    let mut terminal = init_terminal()?;

    // Create event handler
    let mut events = EventHandler::new(std::time::Duration::from_millis(100));

    // Main loop
    let result = run_app(&mut terminal, &mut app, &mut events).await;

    // Restore terminal
    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Failed to restore terminal: {}", e);
    }

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
) -> anyhow::Result<()> {
    loop {
        // Pick up progress from the background question task
        app.poll_events();

        let size = terminal.size()?;
        app.calculate_scroll_bounds(size.width, size.height);
        terminal.draw(|frame| ui::render(frame, app))?;

        // Ticks arrive at least every tick interval, so this also drives redraws.
        let Some(action) = events.next().await else {
            break;
        };
        app.handle_action(action).await;
        if app.should_quit {
            break;
        }
    }

    info!("TUI exited normally");
    Ok(())
}
