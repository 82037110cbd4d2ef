mod app;
mod config;
mod draw;
mod geo;
mod map;
mod measure;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use config::MeasureConfig;
use measure::Unit;

#[derive(Parser, Debug)]
#[command(name = "menseki")]
#[command(version = "0.1.0")]
#[command(about = "A terminal-friendly map area measurement tool")]
struct Args {
    /// Print the unit table as JSON and exit
    #[arg(short, long)]
    units: bool,

    /// Print the session's measurements as JSON on exit
    #[arg(short, long)]
    export: bool,

    /// Override the configured display language (en, zh)
    #[arg(short, long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Handle CLI-only commands
    if args.units {
        return print_units();
    }

    let mut config = MeasureConfig::load();
    if let Some(language) = args.language {
        config.language = language;
    }

    run_tui(config, args.export).await
}

fn print_units() -> Result<()> {
    let units: Vec<_> = Unit::ALL
        .iter()
        .map(|unit| {
            serde_json::json!({
                "unit": unit,
                "symbol": unit.symbol(),
                "square_meters": unit.factor(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&units)?);
    Ok(())
}

async fn run_tui(config: MeasureConfig, export: bool) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config, export);

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Release the shape-created subscription before the session ends
    app.measure.detach();

    if app.export_on_exit {
        println!(
            "{}",
            serde_json::to_string_pretty(&app.measure.measurements(&app.surface))?
        );
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        // Periodic refresh
        app.tick();
    }
}
