pub mod config;
pub mod presenter;
pub mod types;

use anyhow::Result;

pub use config::OutputConfig;
pub use presenter::Emitter;

use types::Envelope;

/// Writes one result envelope to stdout in the configured format.
pub fn emit(env: &Envelope) -> Result<()> {
    Emitter::from_env(OutputConfig::from_env()).emit(env)?;
    Ok(())
}
