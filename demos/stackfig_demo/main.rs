//! # stackfig demo application
//!
//! A sample CLI tool that resolves a two-level configuration tree from all
//! five layers and prints the result as JSON. It exists to demonstrate and
//! manually verify stackfig's behavior.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example stackfig_demo
//! cargo run --example stackfig_demo -- config list
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature | How to exercise it |
//! |---|---|
//! | Defaults | `cargo run --example stackfig_demo` |
//! | Config file | Write `~/.config/app_name/config.json`, or pass `--config-file PATH` |
//! | Lowercase env | `env 'app_name.key_02.subkey_01=env' cargo run --example stackfig_demo` |
//! | Uppercase env | `APP_NAME_KEY_00=env cargo run --example stackfig_demo` |
//! | CLI flag | `cargo run --example stackfig_demo -- --key_03.subkey_01.subsubkey_00 cli` |
//! | Provenance | `cargo run --example stackfig_demo -- config list` |
//! | Name table | `cargo run --example stackfig_demo -- config env` |
//! | `config gen` | `cargo run --example stackfig_demo -- config gen -o /tmp/config.json` |
//! | Logging | `RUST_LOG=stackfig=trace cargo run --example stackfig_demo` |

mod config;

use std::path::PathBuf;

use clap::Arg;
use stackfig::{ConfigArgs, Stackfig, StackfigBuilder};
use tracing_subscriber::EnvFilter;

use config::DemoConfig;

fn make_builder(config_file: Option<&PathBuf>) -> StackfigBuilder<DemoConfig> {
    let builder = Stackfig::builder::<DemoConfig>().app_name("app_name");
    match config_file {
        Some(path) => builder.config_file(path),
        None => builder,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = make_builder(None)
        .command()
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        })
        .arg(
            Arg::new("config-file")
                .long("config-file")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Read this config file instead of the platform default"),
        )
        .subcommand(ConfigArgs::subcommand());
    let matches = command.get_matches();
    let builder = make_builder(matches.get_one::<PathBuf>("config-file")).cli_matches(&matches);

    let outcome = match matches.subcommand() {
        Some(("config", sub)) => {
            let args = ConfigArgs::from_matches(sub).unwrap_or_else(|e| e.exit());
            builder.handle_and_print(&args.into_action())
        }
        _ => builder.print_json(),
    };
    if let Err(e) = outcome {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
