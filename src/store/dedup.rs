//! Dedup ledger: the set of message ids already written as email rows.

use std::collections::HashSet;

use crate::error::StoreError;
use crate::store::RowStore;

/// Reads the processed-id set from the store. Never cached across runs.
pub struct DedupIndex;

impl DedupIndex {
    /// Non-empty (after trimming) message ids from the Emails table.
    pub async fn load(store: &dyn RowStore) -> Result<HashSet<String>, StoreError> {
        let ids: HashSet<String> = store
            .read_message_ids()
            .await?
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        tracing::debug!(
            backend = store.backend_name(),
            processed = ids.len(),
            "Dedup ledger loaded"
        );
        Ok(ids)
    }
}
