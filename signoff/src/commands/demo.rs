use std::io::Write;
use std::path::Path;

use clap::Parser;
use libsignoff::{Engine, MemoryStore, NewTask, Status, Task};
use log::*;
use signoff_config::Directory;

use super::{engine, load_config};

pub const DEMO_REQUESTER: &str = "manager@company.com";
pub const DEMO_APPROVERS: [&str; 3] = ["security@company.com", "user1@test.com", "user2@test.com"];

#[derive(Parser, Debug)]
pub struct Demo {
    /// Also approve the task on behalf of every remaining approver
    #[clap(long = "complete")]
    complete: bool,
}

/// Create the sample task, already approved by its first approver.
pub fn seed(engine: &Engine<MemoryStore>) -> Result<Task, anyhow::Error> {
    let task = engine.create_task(
        NewTask::new(
            "Implement Security Protocol",
            "Add multi-factor authentication and encryption to user login system",
            DEMO_REQUESTER,
        )
        .approvers(DEMO_APPROVERS),
    )?;
    let decision = engine.approve_task(&task.id, DEMO_APPROVERS[0])?;
    info!("seeded demo task {}", task.id);
    Ok(decision.task)
}

impl Demo {
    pub fn run(self, path: Option<&Path>) -> Result<(), anyhow::Error> {
        let global = load_config(path)?;
        let directory = global.directory();
        let engine = engine(&global);

        let mut task = seed(&engine)?;
        if self.complete {
            for approver in DEMO_APPROVERS.iter().skip(1) {
                task = engine.approve_task(&task.id, approver)?.task;
            }
        }

        let mut stdout = std::io::stdout();
        for task in engine.list_tasks()? {
            print_task(&mut stdout, &engine, &directory, &task)?;
        }

        let stats = engine.stats()?;
        writeln!(
            stdout,
            "Tasks: {} ({} pending, {} approved, {} rejected)",
            stats.tasks.total, stats.tasks.pending, stats.tasks.approved, stats.tasks.rejected
        )?;
        writeln!(
            stdout,
            "Approvals: {} ({} pending, {} approved, {} rejected)",
            stats.approvals.total,
            stats.approvals.pending,
            stats.approvals.approved,
            stats.approvals.rejected
        )?;
        Ok(())
    }
}

fn print_task<W: Write>(
    w: &mut W,
    engine: &Engine<MemoryStore>,
    directory: &Directory,
    task: &Task,
) -> Result<(), anyhow::Error> {
    let progress = engine.progress(&task.id)?;
    writeln!(w, "Task {}: {}", task.id, task.title)?;
    writeln!(w, "  {}", task.description)?;
    writeln!(
        w,
        "  Requested by {}",
        directory.display_name(&task.requester)
    )?;
    writeln!(
        w,
        "  Status: {} ({:.0}%)",
        task.status_label(),
        progress.progress_percentage
    )?;
    for approval in engine.task_approvals(&task.id)? {
        let mark = match approval.status() {
            Status::Approved => "+",
            Status::Rejected => "x",
            Status::Pending => " ",
        };
        writeln!(
            w,
            "  [{}] {}",
            mark,
            directory.display_name(&approval.approver)
        )?;
    }
    Ok(())
}
