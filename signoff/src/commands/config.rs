use std::io::Write;
use std::path::Path;

use clap::Parser;

use super::load_config;

#[derive(Parser, Debug)]
pub struct Config {}

impl Config {
    pub fn run(self, path: Option<&Path>) -> Result<(), anyhow::Error> {
        let global = load_config(path)?;
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", global.to_toml()?)?;
        Ok(())
    }
}
