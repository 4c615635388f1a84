//! Per-session credential store
//!
//! Entries are kept in the shared key-value namespace under the session id,
//! in wire form. Only the interceptor appends, only the projector and the
//! lifecycle controller read, and only the controller deletes.

use parking_lot::Mutex;
use std::sync::Arc;

use sandtab_storage::KeyValueStore;

use crate::context::SessionId;
use crate::wire::{self, CredentialEntry};
use crate::Result;

pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
    /// Serializes read-modify-write cycles issued through this handle
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Persist an empty record for a new session
    pub fn initialize(&self, session: &SessionId) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.kv.set(session.as_str(), "")?;
        Ok(())
    }

    /// Append one entry. Duplicates are kept; replay order is append order.
    pub fn append(&self, session: &SessionId, entry: &CredentialEntry) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut text = match self.kv.get(session.as_str())? {
            Some(text) => text,
            None => {
                tracing::warn!(session = %session, "Credential store missing, recreating");
                String::new()
            }
        };

        text.push_str(&wire::serialize(std::slice::from_ref(entry)));
        self.kv.set(session.as_str(), &text)?;

        Ok(())
    }

    pub fn read_all(&self, session: &SessionId) -> Result<Vec<CredentialEntry>> {
        match self.read_raw(session)? {
            Some(text) => wire::deserialize(&text),
            None => Ok(Vec::new()),
        }
    }

    /// Entries that parse, skipping any malformed tokens
    pub fn read_valid(&self, session: &SessionId) -> Result<Vec<CredentialEntry>> {
        Ok(self
            .read_raw(session)?
            .map(|text| wire::deserialize_lenient(&text))
            .unwrap_or_default())
    }

    /// Stored text as-is; `None` when the record does not exist
    pub fn read_raw(&self, session: &SessionId) -> Result<Option<String>> {
        Ok(self.kv.get(session.as_str())?)
    }

    pub fn delete(&self, session: &SessionId) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.kv.delete(session.as_str())?;
        Ok(())
    }
}

impl Clone for CredentialStore {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}
