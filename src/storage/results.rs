use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::ProcessingResult;
use super::tables::*;

impl Database {
    // ========================================================================
    // Processing result operations
    // ========================================================================

    /// Upsert the processing result for a file.
    ///
    /// An existing row for the same file keeps its id and creation time; status
    /// and result text are replaced. Returns the stored row, or `None` without
    /// writing anything when the referenced file does not exist.
    pub fn record_result(
        &self,
        result: &ProcessingResult,
    ) -> Result<Option<ProcessingResult>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let stored = {
            let files = write_txn.open_table(FILES)?;
            if files.get(result.file_id.as_str())?.is_none() {
                return Ok(None);
            }

            let mut table = write_txn.open_table(PROCESSING_RESULTS)?;
            let existing: Option<ProcessingResult> = match table.get(result.file_id.as_str())? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            let stored = match existing {
                Some(existing) => ProcessingResult {
                    id: existing.id,
                    created_at: existing.created_at,
                    ..result.clone()
                },
                None => result.clone(),
            };

            let data = rmp_serde::to_vec_named(&stored)?;
            table.insert(stored.file_id.as_str(), data.as_slice())?;
            stored
        };
        write_txn.commit()?;
        Ok(Some(stored))
    }

    /// Get the processing result for a file
    pub fn get_result(&self, file_id: &str) -> Result<Option<ProcessingResult>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PROCESSING_RESULTS)?;

        match table.get(file_id)? {
            Some(data) => {
                let result: ProcessingResult = rmp_serde::from_slice(data.value())?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }
}
