// Physkeys CLI
// Replays timed key scripts through the key-event router against an in-memory editor

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;

use physkeys_core::event::{replay, ReplayScript};
use physkeys_core::settings::default_settings_content;
use physkeys_core::{Config, Settings, TextBuffer};

/// Physical-keyboard input method core
#[derive(Parser, Debug)]
#[command(name = "physkeys")]
#[command(author = "physkeys contributors")]
#[command(version)]
#[command(about = "Replay key scripts through the physical-keyboard input engine", long_about = None)]
struct Args {
    /// Keyboard TOML configuration file (built-in QWERTY tables when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Settings TOML file (defaults to ~/.config/physkeys/settings.toml)
    #[arg(short, long, value_name = "SETTINGS")]
    settings: Option<PathBuf>,

    /// Replay script to run
    #[arg(long, value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and settings, then exit
    #[arg(long)]
    check_config: bool,

    /// Print a commented default settings file and exit
    #[arg(long)]
    print_default_settings: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::from_toml_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn load_settings(args: &Args) -> Result<Settings> {
    match &args.settings {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings {}", path.display())),
        None => Settings::load_default().context("failed to load default settings"),
    }
}

fn run(args: Args) -> Result<()> {
    if args.print_default_settings {
        print!("{}", default_settings_content());
        return Ok(());
    }

    let config = load_config(&args)?;
    let settings = load_settings(&args)?;
    log::info!(
        "config {} loaded (long press {}ms, multi-tap {}ms)",
        config.name.as_deref().unwrap_or("<builtin>"),
        settings.long_press_threshold_ms(),
        config.multi_tap_window.as_millis()
    );

    if args.check_config {
        println!("Configuration OK");
        return Ok(());
    }

    let Some(script_path) = &args.script else {
        bail!("--script is required unless --check-config or --print-default-settings is given");
    };
    let script = ReplayScript::from_file(script_path)
        .with_context(|| format!("failed to load script {}", script_path.display()))?;

    let mut router = config.build_router(settings);
    let mut buffer = TextBuffer::new();
    let records = replay(&mut router, &mut buffer, &script, Instant::now());

    for record in &records {
        let decision = record
            .decision
            .map(|d| format!("{:?}", d))
            .unwrap_or_else(|| "-".to_string());
        println!("{:>6}ms  {:<24} {:<28} {:?}", record.at_ms, record.step.to_string(), decision, record.text);
        for notification in &record.notifications {
            println!("{:>8}  {:?}", "", notification);
        }
    }

    println!();
    println!("text:      {:?}", buffer.text());
    if !buffer.clipboard().is_empty() {
        println!("clipboard: {:?}", buffer.clipboard());
    }
    if !buffer.synthesized_keys().is_empty() {
        let keys: Vec<String> = buffer.synthesized_keys().iter().map(|k| k.to_string()).collect();
        println!("keys:      {}", keys.join(" "));
    }
    if !buffer.launched().is_empty() {
        let keys: Vec<String> = buffer.launched().iter().map(|k| k.to_string()).collect();
        println!("launched:  {}", keys.join(" "));
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run(args)
}
