use std::io::{self, BufRead};
use std::path::PathBuf;
use std::{env, fs, process};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nomia::{Direction, Library, Response, Settings, Terminal};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        error!(error = %e, "nomia failed");
        process::exit(1);
    }
}

fn run() -> nomia::Result<()> {
    let config_dir = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let settings = Settings::load(&config_dir)?;
    let fields = settings.field_table();
    let library = match &settings.path {
        Some(path) => Library::from_json(&fs::read_to_string(path)?, &fields)?,
        None => {
            warn!("no library path configured, starting empty");
            Library::new()
        }
    };
    info!(entries = library.len(), "library loaded");

    let mut terminal = Terminal::new(library, &settings)?;
    print_listing(&terminal)?;

    // edits made before a failure are still written out
    let outcome = session(&mut terminal, &settings);
    let saved = save(&terminal, &settings);
    outcome.and(saved)
}

fn session(terminal: &mut Terminal, settings: &Settings) -> nomia::Result<()> {
    // completing the same text again cycles through the suggestions
    let mut last_typed: Option<String> = None;
    for line in io::stdin().lock().lines() {
        let line = line?;
        if let Some((text, _)) = line.split_once('\t') {
            if last_typed.as_deref() != Some(text) {
                terminal.reset_suggestions();
            }
            let (completed, _) = terminal.autocomplete(text, text.chars().count(), Direction::Forward);
            println!("{}", completed);
            last_typed = Some(text.to_string());
            continue;
        }
        last_typed = None;
        if line.trim().is_empty() {
            continue;
        }
        match terminal.execute(&line) {
            Ok(Response::Quit) => break,
            Ok(Response::Prompt(text)) => println!("> {}", text),
            Ok(Response::Refreshed) | Ok(Response::Toggled { .. }) => {
                save(terminal, settings)?;
                print_listing(terminal)?;
            }
            Err(e) => println!("error: {}", e),
        }
    }
    Ok(())
}

fn print_listing(terminal: &Terminal) -> nomia::Result<()> {
    for line in terminal.listing()? {
        println!("{}", line);
    }
    Ok(())
}

fn save(terminal: &Terminal, settings: &Settings) -> nomia::Result<()> {
    let Some(path) = &settings.path else {
        return Ok(());
    };
    if settings.dry_run {
        return Ok(());
    }
    if terminal.library().lock()?.save(path)? {
        info!(path = %path.display(), "library saved");
    }
    Ok(())
}
