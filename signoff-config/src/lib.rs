//! Configuration for signoff.
//!
//! The global configuration lives in a single TOML file. Every section is
//! optional, so an empty or missing file yields the defaults:
//!
//! ```toml
//! ids = "sequence"
//!
//! [policy]
//! rejection = "terminal"
//! duplicate_approvers = "dedupe"
//! default_reject_reason = "Rejected by approver"
//!
//! [[users]]
//! email = "tech.lead@company.com"
//! name = "Tech Lead"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::*;
use serde::{Deserialize, Serialize};

mod directory;

pub use directory::{Directory, User};

pub const CONFIG_FILE: &str = "config.toml";
pub const CONFIG_DIR_ENV: &str = "SIGNOFF_CONFIG_DIR";
pub const DEFAULT_REJECT_REASON: &str = "Rejected by approver";

/// What happens when a rejected task later collects every approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionPolicy {
    /// Unanimous approval recomputes the task to `approved`, even after a
    /// rejection has been recorded.
    #[default]
    Overridable,
    /// Once rejected, a task stays rejected.
    Terminal,
}

/// How repeated entries in a task's approver list are handled at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateApprovers {
    /// Creation fails with a validation error.
    #[default]
    Reject,
    /// Later occurrences are dropped, keeping first-seen order.
    Dedupe,
}

/// Identifier scheme for new tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    #[default]
    Uuid,
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub rejection: RejectionPolicy,
    pub duplicate_approvers: DuplicateApprovers,
    pub default_reject_reason: String,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            rejection: RejectionPolicy::default(),
            duplicate_approvers: DuplicateApprovers::default(),
            default_reject_reason: DEFAULT_REJECT_REASON.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub ids: IdScheme,
    pub policy: Policy,
    pub users: Vec<User>,
}

impl Default for Global {
    fn default() -> Self {
        Global {
            ids: IdScheme::default(),
            policy: Policy::default(),
            users: directory::sample_users(),
        }
    }
}

/// Directory holding the global configuration file.
pub fn global_config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    let mut dir = dirs_next::config_dir()?;
    dir.push("signoff");
    Some(dir)
}

impl Global {
    /// Load the global configuration, returning it together with the path
    /// it was read from (`None` when the defaults were used).
    pub fn load() -> Result<(Global, Option<PathBuf>), anyhow::Error> {
        let Some(dir) = global_config_dir() else {
            debug!("no configuration directory, using defaults");
            return Ok((Global::default(), None));
        };
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!("{:?} does not exist, using defaults", path);
            return Ok((Global::default(), None));
        }
        let global = Global::from_path(&path)?;
        Ok((global, Some(path)))
    }

    pub fn from_path(path: &Path) -> Result<Global, anyhow::Error> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read configuration file {:?}", path))?;
        let global = Global::parse(&contents)
            .with_context(|| format!("Invalid configuration file {:?}", path))?;
        info!("loaded configuration from {:?}", path);
        Ok(global)
    }

    pub fn parse(contents: &str) -> Result<Global, anyhow::Error> {
        let global: Global = toml::from_str(contents)?;
        Ok(global)
    }

    pub fn to_toml(&self) -> Result<String, anyhow::Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn directory(&self) -> Directory {
        Directory::new(self.users.clone())
    }
}
