use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueHint};
use log::*;
use signoff_api::{router, Message, MessagePayload, MessageRouter};

use super::{engine, load_config};

#[derive(Parser, Debug)]
pub struct Replay {
    /// File of JSON requests, one per line. `-` reads standard input.
    #[clap(value_hint = ValueHint::FilePath)]
    input: PathBuf,
    #[clap(long = "output-format", value_enum)]
    output_format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Plain,
}

impl Replay {
    pub fn run(self, path: Option<&Path>) -> Result<(), anyhow::Error> {
        let global = load_config(path)?;
        let router = router(Arc::new(engine(&global)), global.directory())?;

        let input: Box<dyn BufRead> = if self.input.as_os_str() == "-" {
            Box::new(BufReader::new(std::io::stdin()))
        } else {
            let file = File::open(&self.input)
                .with_context(|| format!("Could not open {:?}", self.input))?;
            Box::new(BufReader::new(file))
        };

        let format = self.output_format.unwrap_or_default();
        let mut stdout = std::io::stdout();
        for (n, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let reply = replay_line(&router, &line);
            if let MessagePayload::Error(ref e) = reply.payload {
                debug!("line {}: {} {}", n + 1, e.code, e.message);
            }
            match format {
                OutputFormat::Json => {
                    serde_json::to_writer(&mut stdout, &reply)?;
                    writeln!(stdout)?;
                }
                OutputFormat::Plain => writeln!(stdout, "{}", summary(&reply))?,
            }
        }
        Ok(())
    }
}

/// Dispatch one request line. Lines that do not parse get an uncorrelated
/// error reply.
pub fn replay_line(router: &MessageRouter, line: &str) -> Message {
    match Message::from_json(line) {
        Ok(request) => router.dispatch(&request),
        Err(e) => Message::new(MessagePayload::error(&e)),
    }
}

fn summary(reply: &Message) -> String {
    match reply.payload {
        MessagePayload::Task(ref t) => format!("task {} {}", t.id, t.status_label()),
        MessagePayload::TaskDecision(ref d) => {
            format!("{}: task {} {}", d.message, d.task.id, d.task.status_label())
        }
        MessagePayload::Tasks(ref tasks) => {
            let tasks: Vec<String> = tasks
                .iter()
                .map(|t| format!("{} {}", t.id, t.status_label()))
                .collect();
            format!("tasks [{}]", tasks.join(", "))
        }
        MessagePayload::Approvals(ref a) => format!("approvals {}", a.len()),
        MessagePayload::UserApprovals(ref a) => format!("user approvals {}", a.len()),
        MessagePayload::Progress(ref p) => format!(
            "progress {} {}/{} ({:.0}%)",
            p.task_id, p.approved_count, p.total_approvers, p.progress_percentage
        ),
        MessagePayload::Stats(ref s) => format!(
            "stats tasks {} approvals {}",
            s.tasks.total, s.approvals.total
        ),
        MessagePayload::HealthStatus(ref h) => format!(
            "health {} tasks {} approvals {}",
            h.status, h.tasks_count, h.approvals_count
        ),
        MessagePayload::Users(ref u) => format!("users {}", u.len()),
        MessagePayload::Error(ref e) => format!("error {} {}", e.code, e.message),
        ref other => other.message_type().to_string(),
    }
}
