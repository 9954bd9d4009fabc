use redb::{ReadableTable, ReadableTableMetadata};

use super::db::{Database, DatabaseError};
use super::models::{FileRecord, ProcessingResult};
use super::tables::*;

/// Rows overwritten by [`Database::put_file`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacedFile {
    pub file: FileRecord,
    pub result: Option<ProcessingResult>,
}

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Insert or replace a file record keyed by its id.
    ///
    /// Replacing a record also removes its processing result in the same
    /// transaction, since the result described the old content. The replaced
    /// rows are returned so a caller can undo the write with
    /// [`Database::restore_file`].
    pub fn put_file(&self, file: &FileRecord) -> Result<Option<ReplacedFile>, DatabaseError> {
        debug_assert!(!file.id.is_empty(), "file id must not be empty");

        let write_txn = self.begin_write()?;
        let replaced = {
            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(file)?;
            let previous = match table.insert(file.id.as_str(), data.as_slice())? {
                Some(old) => Some(rmp_serde::from_slice::<FileRecord>(old.value())?),
                None => None,
            };

            match previous {
                Some(previous) => {
                    let mut results = write_txn.open_table(PROCESSING_RESULTS)?;
                    let result = match results.remove(file.id.as_str())? {
                        Some(old) => Some(rmp_serde::from_slice::<ProcessingResult>(old.value())?),
                        None => None,
                    };
                    Some(ReplacedFile {
                        file: previous,
                        result,
                    })
                }
                None => None,
            }
        };
        write_txn.commit()?;
        Ok(replaced)
    }

    /// Put back the rows a [`Database::put_file`] call replaced
    pub fn restore_file(&self, replaced: &ReplacedFile) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(&replaced.file)?;
            table.insert(replaced.file.id.as_str(), data.as_slice())?;

            let mut results = write_txn.open_table(PROCESSING_RESULTS)?;
            match &replaced.result {
                Some(result) => {
                    let data = rmp_serde::to_vec_named(result)?;
                    results.insert(replaced.file.id.as_str(), data.as_slice())?;
                }
                None => {
                    results.remove(replaced.file.id.as_str())?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a file by its id
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Check whether a file record exists
    pub fn file_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;
        Ok(table.get(id)?.is_some())
    }

    /// Delete a file record together with its processing result
    pub fn delete_file(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(FILES)?;
            let removed = table.remove(id)?.is_some();
            if removed {
                let mut results = write_txn.open_table(PROCESSING_RESULTS)?;
                results.remove(id)?;
            }
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// List all files, newest first
    pub fn list_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let file: FileRecord = rmp_serde::from_slice(value.value())?;
            files.push(file);
        }

        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    /// Number of stored file records
    pub fn count_files(&self) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;
        Ok(table.len()?)
    }
}
