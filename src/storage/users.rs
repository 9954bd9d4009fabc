use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{SessionRecord, UserRecord};
use super::tables::*;

/// Result of inserting a new user
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    Created(UserRecord),
    EmailTaken,
    UsernameTaken,
}

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a user unless the username or email is already registered.
    ///
    /// The uniqueness checks and the insert share one write transaction.
    pub fn create_user(&self, user: &UserRecord) -> Result<SignUpOutcome, DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut usernames = write_txn.open_table(USERNAMES)?;
            if usernames.get(user.username.as_str())?.is_some() {
                return Ok(SignUpOutcome::UsernameTaken);
            }

            let mut emails = write_txn.open_table(EMAILS)?;
            if emails.get(user.email.as_str())?.is_some() {
                return Ok(SignUpOutcome::EmailTaken);
            }

            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(user)?;
            table.insert(user.id.as_str(), data.as_slice())?;
            usernames.insert(user.username.as_str(), user.id.as_str())?;
            emails.insert(user.email.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(SignUpOutcome::Created(user.clone()))
    }

    /// Get a user by id
    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Get a user by username (resolves username -> id -> user)
    pub fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let usernames = read_txn.open_table(USERNAMES)?;

        let id = match usernames.get(username)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let table = read_txn.open_table(USERS)?;
        match table.get(id.as_str())? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Mark a user as confirmed. Returns false when the username is unknown.
    pub fn confirm_user(&self, username: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let usernames = write_txn.open_table(USERNAMES)?;
            let id = usernames.get(username)?.map(|v| v.value().to_string());
            let table = write_txn.open_table(USERS)?;
            match id {
                Some(id) => match table.get(id.as_str())? {
                    Some(data) => Some(rmp_serde::from_slice::<UserRecord>(data.value())?),
                    None => None,
                },
                None => None,
            }
        };

        let confirmed = match existing {
            Some(mut user) => {
                user.confirmed = true;
                let data = rmp_serde::to_vec_named(&user)?;
                let mut table = write_txn.open_table(USERS)?;
                table.insert(user.id.as_str(), data.as_slice())?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(confirmed)
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Store a session under the digest of its access token
    pub fn put_session(
        &self,
        token_digest: &str,
        session: &SessionRecord,
    ) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let data = rmp_serde::to_vec_named(session)?;
            table.insert(token_digest, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_session(&self, token_digest: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        match table.get(token_digest)? {
            Some(data) => {
                let session: SessionRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    pub fn delete_session(&self, token_digest: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let deleted = table.remove(token_digest)?.is_some();
            deleted
        };
        write_txn.commit()?;
        Ok(deleted)
    }
}
