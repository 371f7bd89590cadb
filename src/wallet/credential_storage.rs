// src/wallet/credential_storage.rs
//! Credential storage management for the wallet component.
//!
//! Keeps credential records in an injected key-value [`Storage`] together
//! with an ordered list of their keys (stored under [`LIST_KEY`]) used for
//! enumeration. Every record lives under `credential:<rootHash>`, so each
//! unique attestation request is stored at most once.
//!
//! # Consistency
//! A key is in the list if and only if its record exists. Saves and deletes
//! hold an internal async mutex from the record write through the list
//! update, so concurrent mutations through one store neither lose appended
//! keys nor leave a record without its list entry. Separate store instances
//! over the same backend are not coordinated.
//!
//! A storage failure between the record write and the list write breaks the
//! invariant until the next successful save or delete of that credential; see
//! the `# Errors` sections below.

use crate::error::StoreError;
use crate::models::credential::{Credential, LIST_KEY};
use crate::models::did::DidUri;
use crate::services::notifier::{Notifier, Revalidation, Subscription};
use crate::storage::{Storage, StorageMap};
use log::debug;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Durable credential records plus the key list that enumerates them.
///
/// Observers learn about changes through the store's [`Notifier`]:
/// - `Revalidation::Credential(key)` after a record is written or removed
/// - `Revalidation::CredentialList` after the key list itself changed
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
    notifier: Notifier,
    write_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_notifier(storage, Notifier::default())
    }

    pub fn with_notifier(storage: Arc<dyn Storage>, notifier: Notifier) -> Self {
        CredentialStore {
            storage,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Shorthand for `notifier().subscribe()`.
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    /// Returns the stored key list, or an empty list if none was ever written.
    ///
    /// # Errors
    /// Storage failures, or a list value that is not an array of strings.
    pub async fn get_list(&self) -> Result<Vec<String>, StoreError> {
        let mut result = self.storage.get(&[LIST_KEY.to_string()]).await?;
        match result.remove(LIST_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|source| StoreError::Corrupted {
                key: LIST_KEY.to_string(),
                source,
            }),
        }
    }

    async fn save_list(&self, list: &[String]) -> Result<(), StoreError> {
        let mut items = StorageMap::new();
        items.insert(LIST_KEY.to_string(), Value::from(list.to_vec()));
        self.storage.set(items).await?;
        self.notifier.notify(Revalidation::CredentialList);
        Ok(())
    }

    /// Writes a credential under its content-hash key and registers the key
    /// in the list.
    ///
    /// # Behavior
    /// - The record-level signal fires once the record is written
    /// - The list-level signal fires only if the key was newly appended
    /// - Saving the same content again updates the record in place; the list
    ///   keeps exactly one entry for it
    ///
    /// # Errors
    /// Storage failures propagate unchanged.
    /// - Record write fails: nothing changed, no signal fired
    /// - List write fails: the record stays written without a list entry and
    ///   the record-level signal has already fired; saving again repairs the
    ///   list
    pub async fn save_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        let key = credential.storage_key();
        let value = serde_json::to_value(credential).map_err(StoreError::Encoding)?;

        let _guard = self.write_lock.lock().await;
        let mut items = StorageMap::new();
        items.insert(key.clone(), value);
        self.storage.set(items).await?;
        self.notifier.notify(Revalidation::Credential(key.clone()));

        let mut list = self.get_list().await?;
        if list.contains(&key) {
            debug!("updated {key} ({})", credential.status);
            return Ok(());
        }
        list.push(key);
        self.save_list(&list).await?;
        debug!(
            "added {} to credential list ({} total)",
            credential.storage_key(),
            list.len()
        );
        Ok(())
    }

    /// Reads the records for `keys`.
    ///
    /// The result follows the order of `keys`. Keys without a record are
    /// skipped, as are repeated keys after their first occurrence.
    ///
    /// # Errors
    /// Storage failures, or a record that no longer parses as a credential.
    pub async fn get_credentials(&self, keys: &[String]) -> Result<Vec<Credential>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut result = self.storage.get(keys).await?;

        let mut credentials = Vec::with_capacity(result.len());
        for key in keys {
            let Some(value) = result.remove(key) else {
                continue;
            };
            let credential = serde_json::from_value(value).map_err(|source| StoreError::Corrupted {
                key: key.clone(),
                source,
            })?;
            credentials.push(credential);
        }
        Ok(credentials)
    }

    /// Reads a single record by storage key.
    pub async fn get_credential(&self, key: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.get_credentials(&[key.to_string()]).await?.pop())
    }

    /// All stored credentials, in list order.
    pub async fn get_all_credentials(&self) -> Result<Vec<Credential>, StoreError> {
        let list = self.get_list().await?;
        self.get_credentials(&list).await
    }

    /// Stored credentials whose claim is about `owner`.
    pub async fn identity_credentials(
        &self,
        owner: &DidUri,
    ) -> Result<Vec<Credential>, StoreError> {
        let all = self.get_all_credentials().await?;
        Ok(all.into_iter().filter(|c| c.owner() == owner).collect())
    }

    /// Removes a credential record and its list entry.
    ///
    /// Deleting a credential that was never saved succeeds and leaves the
    /// list unchanged.
    ///
    /// # Errors
    /// Storage failures propagate unchanged.
    /// - Record removal fails: nothing changed, no signal fired
    /// - List write fails: the key stays listed without a record, which
    ///   `get_credentials` skips; deleting again repairs the list
    pub async fn delete_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        let key = credential.storage_key();

        let _guard = self.write_lock.lock().await;
        self.storage.remove(&key).await?;
        self.notifier.notify(Revalidation::Credential(key.clone()));

        let mut list = self.get_list().await?;
        let before = list.len();
        list.retain(|entry| entry != &key);
        if list.len() == before {
            debug!("{key} was not listed, list unchanged");
            return Ok(());
        }
        self.save_list(&list).await?;
        debug!("removed {key} from credential list ({} left)", list.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::models::credential::fixtures::{credential, credential_for};
    use crate::models::credential::AttestationStatus;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    fn new_store() -> (Arc<MemoryStorage>, CredentialStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = CredentialStore::new(storage.clone());
        (storage, store)
    }

    /// Memory storage that can stall record writes, stall after removals, and
    /// fail writes of the key list only.
    #[derive(Default)]
    struct StagedStorage {
        inner: MemoryStorage,
        record_set_delay: Duration,
        remove_delay: Duration,
        fail_list_writes: AtomicBool,
    }

    #[async_trait]
    impl Storage for StagedStorage {
        async fn get(&self, keys: &[String]) -> Result<StorageMap, StorageError> {
            self.inner.get(keys).await
        }

        async fn set(&self, items: StorageMap) -> Result<(), StorageError> {
            if items.contains_key(LIST_KEY) {
                if self.fail_list_writes.load(Ordering::SeqCst) {
                    return Err(StorageError::Unavailable("list write rejected".to_string()));
                }
            } else {
                sleep(self.record_set_delay).await;
            }
            self.inner.set(items).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await?;
            sleep(self.remove_delay).await;
            Ok(())
        }
    }

    async fn is_listed_and_stored(store: &CredentialStore, key: &str) -> (bool, bool) {
        let listed = store.get_list().await.unwrap().iter().any(|k| k == key);
        let stored = store.get_credential(key).await.unwrap().is_some();
        (listed, stored)
    }

    #[tokio::test]
    async fn test_empty_store_has_empty_list() {
        let (_, store) = new_store();
        assert!(store.get_list().await.unwrap().is_empty());
        assert!(store.get_all_credentials().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_get_returns_equal_record() {
        let (_, store) = new_store();
        let cred = credential("0xaa");

        store.save_credential(&cred).await.unwrap();

        let stored = store.get_credentials(&[cred.storage_key()]).await.unwrap();
        assert_eq!(stored, vec![cred]);
    }

    #[tokio::test]
    async fn test_save_is_idempotent_on_list() {
        let (_, store) = new_store();
        let cred = credential("0xaa");

        store.save_credential(&cred).await.unwrap();
        store
            .save_credential(&cred.with_status(AttestationStatus::Attested))
            .await
            .unwrap();

        let list = store.get_list().await.unwrap();
        assert_eq!(list, vec![cred.storage_key()]);

        let stored = store.get_credential(&cred.storage_key()).await.unwrap().unwrap();
        assert_eq!(stored.status, AttestationStatus::Attested);
    }

    #[tokio::test]
    async fn test_signals_on_new_and_existing_keys() {
        let (_, store) = new_store();
        let cred = credential("0xaa");
        let mut signals = store.subscribe();

        store.save_credential(&cred).await.unwrap();
        assert_eq!(
            signals.drain(),
            vec![
                Revalidation::Credential(cred.storage_key()),
                Revalidation::CredentialList
            ]
        );

        store.save_credential(&cred).await.unwrap();
        assert_eq!(signals.drain(), vec![Revalidation::Credential(cred.storage_key())]);
    }

    #[tokio::test]
    async fn test_get_credentials_preserves_input_order() {
        let (_, store) = new_store();
        for hash in ["0x03", "0x01", "0x02"] {
            store.save_credential(&credential(hash)).await.unwrap();
        }

        let keys: Vec<String> = ["0x02", "0x404", "0x03", "0x02"]
            .iter()
            .map(|h| crate::models::credential::credential_key(h))
            .collect();
        let hashes: Vec<String> = store
            .get_credentials(&keys)
            .await
            .unwrap()
            .iter()
            .map(|c| c.root_hash().to_string())
            .collect();

        assert_eq!(hashes, vec!["0x02", "0x03"]);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_list_entry() {
        let (_, store) = new_store();
        let keep = credential("0x01");
        let gone = credential("0x02");
        store.save_credential(&keep).await.unwrap();
        store.save_credential(&gone).await.unwrap();

        store.delete_credential(&gone).await.unwrap();

        assert_eq!(store.get_list().await.unwrap(), vec![keep.storage_key()]);
        assert!(store
            .get_credentials(&[gone.storage_key()])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_is_noop() {
        let (_, store) = new_store();
        let saved = credential("0x01");
        store.save_credential(&saved).await.unwrap();
        let mut signals = store.notifier().subscribe_to(Revalidation::CredentialList);

        store.delete_credential(&credential("0x99")).await.unwrap();

        assert_eq!(store.get_list().await.unwrap(), vec![saved.storage_key()]);
        assert!(signals.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_identity_credentials_filters_by_owner() {
        let (_, store) = new_store();
        store.save_credential(&credential_for("0x01", "did:kilt:4alice")).await.unwrap();
        store.save_credential(&credential_for("0x02", "did:kilt:4bob")).await.unwrap();
        store.save_credential(&credential_for("0x03", "did:kilt:4alice")).await.unwrap();

        let alice: DidUri = "did:kilt:4alice".parse().unwrap();
        let owned = store.identity_credentials(&alice).await.unwrap();

        let hashes: Vec<&str> = owned.iter().map(|c| c.root_hash()).collect();
        assert_eq!(hashes, vec!["0x01", "0x03"]);
    }

    #[tokio::test]
    async fn test_failed_save_propagates_and_changes_nothing() {
        let (storage, store) = new_store();
        let mut signals = store.subscribe();
        storage.fail_writes(true);

        let err = store.save_credential(&credential("0x01")).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Unavailable(_))));

        storage.fail_writes(false);
        assert!(store.get_list().await.unwrap().is_empty());
        assert!(signals.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_record_is_reported_with_key() {
        let (storage, store) = new_store();
        let mut items = StorageMap::new();
        items.insert("credential:0xbad".to_string(), Value::from("garbage"));
        storage.set(items).await.unwrap();

        let err = store
            .get_credentials(&["credential:0xbad".to_string()])
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::Corrupted { key, .. } if key == "credential:0xbad")
        );
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_every_key() {
        let (_, store) = new_store();
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                let cred = credential(&format!("0x{i:02}"));
                tokio::spawn(async move { store.save_credential(&cred).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.get_list().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_interleaved_delete_and_save_keep_list_in_sync() {
        let storage = Arc::new(StagedStorage {
            record_set_delay: Duration::from_millis(20),
            remove_delay: Duration::from_millis(100),
            ..StagedStorage::default()
        });
        let store = CredentialStore::new(storage);
        let cred = credential("0x01");
        store.save_credential(&cred).await.unwrap();

        let attested = cred.with_status(AttestationStatus::Attested);
        let (deleted, saved) = tokio::join!(
            store.delete_credential(&cred),
            store.save_credential(&attested)
        );
        deleted.unwrap();
        saved.unwrap();

        let (listed, stored) = is_listed_and_stored(&store, &cred.storage_key()).await;
        assert_eq!(listed, stored);
        assert!(stored);
    }

    #[tokio::test]
    async fn test_failed_delete_propagates_and_changes_nothing() {
        let (storage, store) = new_store();
        let cred = credential("0x01");
        store.save_credential(&cred).await.unwrap();
        let mut signals = store.subscribe();
        storage.fail_writes(true);

        let err = store.delete_credential(&cred).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Unavailable(_))));

        storage.fail_writes(false);
        assert_eq!(
            is_listed_and_stored(&store, &cred.storage_key()).await,
            (true, true)
        );
        assert_eq!(storage.len().await, 2);
        assert!(signals.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_failed_list_write_on_save_keeps_record() {
        let storage = Arc::new(StagedStorage::default());
        let store = CredentialStore::new(storage.clone());
        let cred = credential("0x01");
        let mut signals = store.subscribe();
        storage.fail_list_writes.store(true, Ordering::SeqCst);

        let err = store.save_credential(&cred).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Unavailable(_))));
        assert_eq!(
            is_listed_and_stored(&store, &cred.storage_key()).await,
            (false, true)
        );
        assert_eq!(signals.drain(), vec![Revalidation::Credential(cred.storage_key())]);

        storage.fail_list_writes.store(false, Ordering::SeqCst);
        store.save_credential(&cred).await.unwrap();
        assert_eq!(
            is_listed_and_stored(&store, &cred.storage_key()).await,
            (true, true)
        );
    }

    #[tokio::test]
    async fn test_failed_list_write_on_delete_keeps_stale_entry() {
        let storage = Arc::new(StagedStorage::default());
        let store = CredentialStore::new(storage.clone());
        let cred = credential("0x01");
        store.save_credential(&cred).await.unwrap();
        storage.fail_list_writes.store(true, Ordering::SeqCst);

        let err = store.delete_credential(&cred).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(StorageError::Unavailable(_))));
        assert_eq!(
            is_listed_and_stored(&store, &cred.storage_key()).await,
            (true, false)
        );
        assert!(store.get_all_credentials().await.unwrap().is_empty());

        storage.fail_list_writes.store(false, Ordering::SeqCst);
        store.delete_credential(&cred).await.unwrap();
        assert!(store.get_list().await.unwrap().is_empty());
    }
}
