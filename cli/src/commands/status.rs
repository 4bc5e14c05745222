use glidepath::GlidepathError;
use glidepath_core_types::RunId;
use glidepath_runstate::{InMemoryRunStateStore, RunStateStore};
use uuid::Uuid;

use crate::error::CliError;

/// Looks up a run. Run state is process-local (see `cli.rs`'s doc
/// comment on the `Status` command) so this will only ever find a run
/// started earlier in the same process.
pub async fn status(run_id: &str) -> Result<(), CliError> {
    let run_id = Uuid::parse_str(run_id).map_err(|e| CliError::Usage(format!("not a valid run id: {e}")))?;
    let run_id = RunId::from_uuid(run_id);

    let store = InMemoryRunStateStore::new();
    let record = store.get_run(&run_id).await.map_err(GlidepathError::from)?;

    println!("run {}: {}", record.run_id, record.status);
    println!(
        "  trades: {} succeeded, {} failed, {} total",
        record.succeeded_trades,
        record.failed_trades,
        record.total_trades()
    );
    println!("  created_at: {}", record.created_at);
    if let Some(completed_at) = record.completed_at {
        println!("  completed_at: {completed_at}");
    }
    Ok(())
}
