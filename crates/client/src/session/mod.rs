//! Persisted session state.
//!
//! The logged-in user's identity, token and balance live in a small
//! key-value store under fixed keys (`username`, `token`, `balance`). The
//! store is injected, so tests run against [`MemoryStore`] while the CLI
//! uses [`FileStore`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;
use tracing::{debug, warn};

use qkart_core::session::keys;
use qkart_core::{Price, Session, SessionState};

/// Errors that can occur reading or writing the session store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// A string key-value store, the client-side equivalent of `localStorage`.
pub trait KeyValueStore: Send + Sync {
    /// Read a single key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Read several keys from one consistent snapshot, in order.
    ///
    /// A concurrent `set_many` is seen entirely or not at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError>;

    /// Write several keys at once. Readers see all of them or none.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Reads and writes the [`Session`] through a [`KeyValueStore`].
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Wrap a key-value store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written; nothing is persisted
    /// in that case.
    pub fn persist(
        &self,
        token: &str,
        username: &str,
        balance: Price,
    ) -> Result<Session, StorageError> {
        self.store.set_many(&[
            (keys::USERNAME, username.to_string()),
            (keys::TOKEN, token.to_string()),
            (keys::BALANCE, balance.amount().to_string()),
        ])?;
        debug!(username, "Session persisted");
        Ok(Session::new(username, token, balance))
    }

    /// Load the current session.
    ///
    /// A session exists whenever a username is stored. A missing token reads
    /// as empty and a missing or malformed balance reads as zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn read(&self) -> Result<Option<Session>, StorageError> {
        let mut values = self
            .store
            .get_many(&[keys::USERNAME, keys::TOKEN, keys::BALANCE])?
            .into_iter();
        let (Some(username), token, balance) = (
            values.next().flatten(),
            values.next().flatten(),
            values.next().flatten(),
        ) else {
            return Ok(None);
        };

        let token = token.unwrap_or_default();
        let balance = match balance {
            Some(raw) => raw.trim().parse::<u64>().map_or_else(
                |e| {
                    warn!(error = %e, raw = %raw, "Stored balance is not a number");
                    Price::ZERO
                },
                Price::new,
            ),
            None => Price::ZERO,
        };

        Ok(Some(Session::new(username, token, balance)))
    }

    /// Current login state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn state(&self) -> Result<SessionState, StorageError> {
        self.read().map(SessionState::from)
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.clear()?;
        debug!("Session cleared");
        Ok(())
    }

    /// Replace the stored wallet balance, e.g. after checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn update_balance(&self, balance: Price) -> Result<(), StorageError> {
        self.store
            .set_many(&[(keys::BALANCE, balance.amount().to_string())])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use secrecy::ExposeSecret;

    use super::*;

    fn store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new())
    }

    #[test]
    fn test_persist_read_round_trip() {
        let store = store();
        store.persist("testtoken", "criodo", Price::new(5000)).unwrap();

        let session = store.read().unwrap().unwrap();
        assert_eq!(session.username, "criodo");
        assert_eq!(session.token.expose_secret(), "testtoken");
        assert_eq!(session.balance, Price::new(5000));
    }

    #[test]
    fn test_clear_logs_out() {
        let store = store();
        store.persist("testtoken", "criodo", Price::new(5000)).unwrap();
        assert!(store.state().unwrap().is_logged_in());

        store.clear().unwrap();
        assert!(store.read().unwrap().is_none());
        assert!(!store.state().unwrap().is_logged_in());
    }

    #[test]
    fn test_no_username_means_no_session() {
        let store = store();
        store
            .store()
            .set_many(&[(keys::TOKEN, "orphan".to_string())])
            .unwrap();
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_malformed_balance_reads_as_zero() {
        let store = store();
        store
            .store()
            .set_many(&[
                (keys::USERNAME, "criodo".to_string()),
                (keys::BALANCE, "lots".to_string()),
            ])
            .unwrap();

        let session = store.read().unwrap().unwrap();
        assert_eq!(session.balance, Price::ZERO);
        assert_eq!(session.token.expose_secret(), "");
    }

    /// Counts how the session is read from the underlying store.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        single_reads: AtomicUsize,
        snapshot_reads: AtomicUsize,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.single_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
            self.snapshot_reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get_many(keys)
        }

        fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
            self.inner.set_many(entries)
        }

        fn clear(&self) -> Result<(), StorageError> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_read_uses_one_snapshot() {
        let store = SessionStore::new(CountingStore::default());
        store.persist("testtoken", "criodo", Price::new(5000)).unwrap();

        let session = store.read().unwrap().unwrap();
        assert_eq!(session.username, "criodo");
        assert_eq!(session.token.expose_secret(), "testtoken");

        assert_eq!(store.store().snapshot_reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.store().single_reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_update_balance_keeps_identity() {
        let store = store();
        store.persist("testtoken", "criodo", Price::new(5000)).unwrap();
        store.update_balance(Price::new(4740)).unwrap();

        let session = store.read().unwrap().unwrap();
        assert_eq!(session.username, "criodo");
        assert_eq!(session.balance, Price::new(4740));
    }
}
