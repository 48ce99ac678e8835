pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod population; // Off-thread population + form state
pub mod session_cache; // Form snapshot save/restore

pub use config::EngineConfig;
pub use engine::{Engine, ImportOutcome};
pub use error::{DocumentError, ImportError};
pub use population::{FormState, PopulationMessage, PopulationWorker};

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber, filtered by `RUST_LOG` or the
/// crate default. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
