use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use geodata::handlers::{
    handle_discover, handle_init, handle_interactive, handle_run, handle_sources, init_tracing,
    load_settings,
};
use geodata_core::print_banner;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // JSON output owns stdout
    let json = chosen_command
        .subcommand()
        .and_then(|(_, sub)| sub.try_get_one::<String>("format").ok().flatten())
        .is_some_and(|f| f == "json");

    if !quiet && !json {
        print_banner();
    }

    let log_level = chosen_command
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("warn");
    init_tracing(log_level);

    let Some((name, primary_command)) = chosen_command.subcommand() else {
        // No subcommand provided, just show the banner
        return;
    };

    let config = chosen_command.get_one::<String>("config").map(String::as_str);
    if let Err(e) = dispatch(name, primary_command, config).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

async fn dispatch(name: &str, args: &ArgMatches, config: Option<&str>) -> anyhow::Result<()> {
    match name {
        "init" => handle_init(args),
        "sources" => handle_sources(&load_settings(config)?),
        "discover" => handle_discover(args, &load_settings(config)?).await,
        "run" => handle_run(args, &load_settings(config)?).await,
        "interactive" => handle_interactive(args, &load_settings(config)?).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
