mod app;
mod config;
mod error;
mod press;
mod sink;
mod timestamps;
mod ui;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use log::{info, warn};
use ratatui::prelude::*;

use app::App;
use config::Config;
use sink::SinkKind;

// Poll interval; also the resolution of the long press timer
const TICK: Duration = Duration::from_millis(50);

/// Antidelay: extract HH:MM markers from a signal log and save them shifted back
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Text file with the signals to scan (stdin in headless mode when omitted)
    input: Option<PathBuf>,

    /// Config file [default: <config dir>/antidelay/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Destination for the timestamp file
    #[arg(short, long)]
    location: Option<String>,

    /// Seconds to subtract from every marker (anything unparseable counts as 0)
    #[arg(short, long, allow_hyphen_values = true)]
    antidelay: Option<String>,

    /// Where the timestamp file goes
    #[arg(short, long, value_enum)]
    sink: Option<SinkKind>,

    /// Process once and save without starting the TUI
    #[arg(long)]
    headless: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if let Some(location) = &args.location { config.location = location.clone() }
    if let Some(antidelay) = &args.antidelay { config.antidelay = antidelay.clone() }
    if let Some(sink) = args.sink { config.sink = sink }
    Ok(config)
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    // The TUI owns the terminal, so its logs go to a file
    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn run_headless(args: &Args, config: &Config) -> Result<()> {
    let text = read_input(args.input.as_deref())?;
    let antidelay_seconds = timestamps::parse_antidelay(&config.antidelay);
    let processed = timestamps::process_timestamps(&text, antidelay_seconds);
    info!(
        "processed {} timestamps with antidelay {}s",
        processed.len(),
        antidelay_seconds
    );
    let path = config
        .sink
        .build()
        .write(&config.location, &processed.join("\n"))?;
    println!("{}", path.display());
    Ok(())
}

fn run_app(args: &Args, config: &Config) -> Result<()> {
    let text = match &args.input {
        Some(path) => read_input(Some(path))?,
        None => String::new(),
    };
    let mut app = App::new(text, args.input.clone(), config, config.sink.build());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    // Key release events make hold detection exact where the terminal supports them
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    } else {
        warn!("terminal reports no key release events, inferring release from key repeat");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = event_loop(&mut terminal, &mut app);

    // Restore terminal
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    res
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) => {
                    if app.handle_key(key, Instant::now()) {
                        break;
                    }
                }
                Event::FocusLost => app.focus_lost(),
                _ => {}
            }
        }
        app.tick(Instant::now());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.headless {
        init_logging(None)?;
        return run_headless(&args, &config);
    }

    init_logging(Some(&config.log_file))?;
    info!("starting with sink {:?}, destination {:?}", config.sink, config.location);

    // Run the application
    if let Err(err) = run_app(&args, &config) {
        log::error!("{:#}", err);
        eprintln!("Error: {:#}", err);
    }

    Ok(())
}
