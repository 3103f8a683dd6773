use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `regwatch rescore`. Ctrl-C stops the sweep after the current watch
/// list commits.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    let watcher = {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping rescore after the current watch list");
                cancel.store(true, Ordering::Relaxed);
            }
        })
    };

    let result = ctx
        .service
        .rescore_all_with_progress(&cancel, |watch_list_id, created| {
            tracing::info!(watch_list = %watch_list_id, created, "watch list rescored");
        })
        .await;
    watcher.abort();

    let report = result?;
    output(&report, flags.format)
}
