use std::io;

use clap::CommandFactory;
use clap::Parser;
use clap_complete::{generate, Shell};

use crate::Opts;

#[derive(Parser, Debug)]
pub struct Completions {
    /// Shell to generate the script for
    #[clap(value_enum)]
    shell: Shell,
}

impl Completions {
    pub fn run(self) -> Result<(), anyhow::Error> {
        let mut app = Opts::command();
        generate(self.shell, &mut app, "signoff", &mut io::stdout());
        Ok(())
    }
}
