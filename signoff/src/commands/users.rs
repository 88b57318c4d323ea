use std::io::Write;
use std::path::Path;

use clap::Parser;

use super::load_config;

#[derive(Parser, Debug)]
pub struct Users {
    /// Print the directory as JSON
    #[clap(long = "json")]
    json: bool,
}

impl Users {
    pub fn run(self, path: Option<&Path>) -> Result<(), anyhow::Error> {
        let directory = load_config(path)?.directory();
        let mut stdout = std::io::stdout();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, directory.users())?;
            writeln!(stdout)?;
        } else {
            for user in directory.users() {
                writeln!(stdout, "{:<32} {}", user.email, user.name)?;
            }
        }
        Ok(())
    }
}
