//! CLI command implementations.

mod check;
mod plan;
mod record;
mod reset;

pub use check::CheckCmd;
pub use plan::PlanCmd;
pub use record::RecordCmd;
pub use reset::ResetCmd;

use anyhow::{Context, Result};

use crate::config::GateConfig;
use crate::gate::UsageGate;
use crate::store::SqliteStore;

/// Build the gate from the on-disk config and the SQLite store.
pub(crate) async fn open_gate() -> Result<UsageGate<SqliteStore>> {
    let config = GateConfig::load()?;
    let db_path = config.database_path()?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create data directory")?;
    }

    let store = SqliteStore::open(&db_path)
        .await
        .context("Failed to open usage database")?;

    let gate = UsageGate::new(store, config.plans);

    Ok(if config.fail_open {
        gate
    } else {
        gate.fail_closed()
    })
}
