use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use geodata_core::config::{DEFAULT_CONFIG, Settings};
use geodata_core::report::{generate_links_report, generate_run_report};
use geodata_core::{
    Artifact, DownloadOutcome, GeodataHub, LogCallback, Progress, ProgressCallback, RunOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/geodata/config.toml";

/// Expand a leading `~` in a user supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Load settings from an explicit path, or from the default location.
///
/// Only the default location is optional: when nothing is there the
/// built-in defaults are used. An explicit path that cannot be read is an
/// error.
pub fn load_settings(config: Option<&str>) -> Result<Settings> {
    let (path, explicit) = match config {
        Some(raw) => (expand_path(raw), true),
        None => (expand_path(DEFAULT_CONFIG_PATH), false),
    };

    if !explicit && !path.exists() {
        return Ok(Settings::default());
    }

    Settings::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Save the bundle into `output_dir`, creating the directory if needed
pub fn write_artifact(artifact: &Artifact, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let dest = output_dir.join(&artifact.file_name);
    fs::write(&dest, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(dest)
}

/// Color a pipeline status line by its leading marker
pub fn colorize_line(line: &str) -> String {
    if line.starts_with('✓') {
        line.green().to_string()
    } else if line.starts_with('✗') {
        line.red().to_string()
    } else {
        line.bright_white().to_string()
    }
}

/// A bundle that made it to the user's disk
#[derive(Debug)]
pub struct Delivery {
    pub saved_to: PathBuf,
    pub outcomes: Vec<DownloadOutcome>,
    pub report: String,
}

/// Run the hub once and copy the bundle to `output_dir`.
///
/// The scratch directory is released whether or not the copy succeeded.
/// `Ok(None)` means discovery found nothing to download.
pub async fn deliver(
    hub: &GeodataHub,
    output_dir: &Path,
    progress_callback: Option<ProgressCallback>,
    log_callback: Option<LogCallback>,
) -> Result<Option<Delivery>> {
    let result = match hub
        .process(progress_callback, log_callback)
        .await
        .context("Run failed")?
    {
        RunOutcome::NoLinksFound => return Ok(None),
        RunOutcome::Bundled(result) => result,
    };

    let report = generate_run_report(&result);
    let saved = result
        .read_artifact()
        .context("Failed to read the bundle")
        .and_then(|artifact| write_artifact(&artifact, output_dir));
    let outcomes = result.outcomes.clone();
    result.release();

    Ok(Some(Delivery {
        saved_to: saved?,
        outcomes,
        report,
    }))
}

pub fn delivery_json(delivery: &Delivery) -> serde_json::Value {
    serde_json::json!({
        "archive": delivery.saved_to.display().to_string(),
        "outcomes": delivery.outcomes,
    })
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Prompt on stdout. `None` once stdin is closed.
fn print_prompt(msg: &str) -> Option<String> {
    print!("{} ", msg.bright_cyan().bold());
    let _ = io::stdout().flush();
    let mut response = String::new();
    match io::stdin().read_line(&mut response) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(response.trim().to_lowercase()),
    }
}

fn run_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("checking source pages...");
    pb
}

/// Progress and log sinks feeding an indicatif bar
fn bar_sinks(pb: &ProgressBar) -> (ProgressCallback, LogCallback) {
    let bar = pb.clone();
    let progress: ProgressCallback = Arc::new(move |p: Progress| {
        bar.set_length(p.total as u64);
        bar.set_position(p.completed as u64);
        bar.set_message("downloading");
    });

    let bar = pb.clone();
    let log: LogCallback = Arc::new(move |line: String| {
        bar.println(colorize_line(&line));
    });

    (progress, log)
}

fn print_sink() -> LogCallback {
    Arc::new(|line: String| println!("{}", colorize_line(&line)))
}

/// One trigger: discover, download, bundle, save, report
async fn run_once(hub: &GeodataHub, output_dir: &Path, json: bool, show_progress: bool) -> Result<()> {
    let pb = (show_progress && !json).then(run_progress_bar);
    let (progress, log) = match (&pb, json) {
        (Some(pb), _) => {
            let (progress, log) = bar_sinks(pb);
            (Some(progress), Some(log))
        }
        (None, false) => (None, Some(print_sink())),
        (None, true) => (None, None),
    };

    let delivered = deliver(hub, output_dir, progress, log).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let Some(delivery) = delivered? else {
        bail!("No archive links found on any source page, nothing was downloaded");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&delivery_json(&delivery))?);
        return Ok(());
    }

    println!();
    print!("{}", delivery.report);
    println!();
    println!(
        "{} Bundle saved to {}",
        "✓".green().bold(),
        delivery.saved_to.display().to_string().bright_white()
    );
    Ok(())
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  GEODATA HUB INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let raw_path = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let force = args.get_flag("force");
    let config_path = expand_path(raw_path);

    println!(
        "{} Target: {}",
        "→".blue(),
        config_path.display().to_string().bright_white()
    );
    println!();

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A configuration file already exists:");
        println!(
            "  {} {}",
            "•".yellow(),
            config_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Do you want to overwrite it? [y/N]:").unwrap_or_default();
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
    }

    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

pub fn handle_sources(settings: &Settings) -> Result<()> {
    print_divider();
    println!("{}", "  CONFIGURED SOURCES".bright_white().bold());
    print_divider();

    if settings.sources.is_empty() {
        println!("{} No sources configured", "ℹ".blue());
        return Ok(());
    }

    for source in &settings.sources {
        println!();
        println!(
            "{} {}  {}",
            "●".cyan(),
            source.name.bright_white().bold(),
            source.page_url
        );
        for target in &source.targets {
            println!("    {} {} {}", target.term, "→".blue(), target.filename.cyan());
        }
    }
    println!();
    println!(
        "{} Cache TTL: {}s",
        "ℹ".blue(),
        settings.cache_ttl_secs.to_string().cyan()
    );
    Ok(())
}

pub async fn handle_discover(args: &ArgMatches, settings: &Settings) -> Result<()> {
    let json = args.get_one::<String>("format").is_some_and(|f| f == "json");
    let hub = GeodataHub::from_settings(settings).context("Invalid configuration")?;

    let links = hub.discover().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
    } else {
        print!("{}", generate_links_report(&links));
    }

    if links.is_empty() {
        bail!("No archive links found on any source page");
    }
    Ok(())
}

pub async fn handle_run(args: &ArgMatches, settings: &Settings) -> Result<()> {
    let output_dir = expand_path(
        args.get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("."),
    );
    let json = args.get_one::<String>("format").is_some_and(|f| f == "json");
    let show_progress = !args.get_flag("no-progress");

    let hub = GeodataHub::from_settings(settings).context("Invalid configuration")?;

    if !json {
        println!(
            "\n{} Fetching {} source page(s)",
            "→".blue(),
            settings.sources.len()
        );
    }

    run_once(&hub, &output_dir, json, show_progress).await
}

pub async fn handle_interactive(args: &ArgMatches, settings: &Settings) -> Result<()> {
    let output_dir = expand_path(
        args.get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("."),
    );
    let hub = GeodataHub::from_settings(settings).context("Invalid configuration")?;

    print_divider();
    println!("{}", "  GEODATA HUB".bright_white().bold());
    print_divider();
    println!(
        "{} Bundles are saved to {}",
        "ℹ".blue(),
        output_dir.display().to_string().bright_white()
    );
    println!();

    loop {
        let Some(response) = print_prompt("Press Enter to fetch the latest geodata (q to quit):")
        else {
            break;
        };

        match response.as_str() {
            "" => {}
            "q" | "quit" | "exit" => break,
            other => {
                println!("{} Unknown input '{}'", "⚠".yellow(), other);
                continue;
            }
        }

        if let Err(e) = run_once(&hub, &output_dir, false, true).await {
            eprintln!("{} {:#}", "✗".red().bold(), e);
        }

        if let Some(age) = hub.cache().age().await {
            println!(
                "{} Source pages checked {}s ago, rechecked after {}s",
                "ℹ".blue(),
                age.as_secs(),
                hub.cache().ttl().as_secs()
            );
        }
        println!();
    }

    println!("{} Bye.", "→".blue());
    Ok(())
}
