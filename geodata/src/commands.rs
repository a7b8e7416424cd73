use crate::CLAP_STYLING;
use clap::{arg, command};
use geodata::handlers::DEFAULT_CONFIG_PATH;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("geodata")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("geodata")
        .about("Discovers, downloads and bundles IMAC geodata archives")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"log-level" <LEVEL>)
                .required(false)
                .help("Log level when RUST_LOG is not set")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("warn")
                .global(true),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .help(format!(
                    "Configuration file (default: {}, built-in defaults if absent)",
                    DEFAULT_CONFIG_PATH
                ))
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes the default configuration file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the configuration file")
                        .default_value(DEFAULT_CONFIG_PATH),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrite an existing configuration file without asking")
                        .required(false),
                ),
        )
        .subcommand(command!("sources").about("Lists the configured source pages and targets"))
        .subcommand(
            command!("discover")
                .about("Scans the source pages and prints the archive links found")
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("run")
                .about(
                    "Discovers the current archives, downloads them and saves a single bundle \
                to the output directory",
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Directory the bundle is written to")
                        .default_value("."),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Print status lines instead of a progress bar")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("interactive")
                .about(
                    "Prompts for runs until you quit. Source pages are re-checked at most once \
                per cache TTL.",
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Directory bundles are written to")
                        .default_value("."),
                ),
        )
}
