use std::path::PathBuf;

use clap::{Parser, ValueHint};
use human_panic::setup_panic;

mod commands;
use commands::*;

#[derive(Parser, Debug)]
#[clap(
    version,
    author,
    about = "Unanimous multi-party approval of work items",
    max_term_width = 100
)]
pub struct Opts {
    /// Read configuration from this file instead of the global one.
    #[clap(long = "config", global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
pub enum SubCommand {
    /// Seeds a sample task and prints the resulting workflow state
    Demo(Demo),
    /// Dispatches JSON-lines requests through the message router and prints
    /// the replies
    Replay(Replay),
    /// Lists the users of the configured directory
    Users(Users),
    /// Prints the effective configuration
    Config(Config),
    /// Generates shell completion scripts
    Completions(Completions),
}

fn main() {
    setup_panic!();
    env_logger::init();

    let opts = Opts::parse();
    if let Err(e) = run(opts) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(opts: Opts) -> Result<(), anyhow::Error> {
    let config = opts.config;
    match opts.subcmd {
        SubCommand::Demo(d) => d.run(config.as_deref()),
        SubCommand::Replay(r) => r.run(config.as_deref()),
        SubCommand::Users(u) => u.run(config.as_deref()),
        SubCommand::Config(c) => c.run(config.as_deref()),
        SubCommand::Completions(c) => c.run(),
    }
}
