use std::path::Path;

use libsignoff::{ids, Engine, MemoryStore};
use log::*;
use signoff_config::Global;

mod completions;
pub use completions::Completions;

mod config;
pub use config::Config;

mod demo;
pub use demo::Demo;

mod replay;
pub use replay::Replay;

mod users;
pub use users::Users;

/// The configuration named on the command line, or the global one.
pub fn load_config(path: Option<&Path>) -> Result<Global, anyhow::Error> {
    match path {
        Some(path) => Global::from_path(path),
        None => {
            let (global, source) = Global::load()?;
            if let Some(source) = source {
                debug!("using configuration {:?}", source);
            }
            Ok(global)
        }
    }
}

/// A fresh in-memory engine using the configured policy and id scheme.
pub fn engine(global: &Global) -> Engine<MemoryStore> {
    Engine::new(MemoryStore::new(), global.policy.clone())
        .with_id_generator(ids::from_scheme(global.ids))
}
