//! Per-user expense collection
//!
//! Documents live in `users/<uid>/expenses.json` as a JSON object keyed by
//! expense id. Observers registered with `subscribe` receive the complete,
//! current set of expenses after every change, never a diff.
//!
//! Every write re-reads the file under the write lock and applies its change
//! to what is on disk, so writers sharing the file never overwrite each
//! other's documents with a stale copy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::error::{TallyError, TallyResult};
use crate::models::{Expense, ExpenseId, ExpenseRecord, UserId};

use super::file_io::{read_document, remove_document, write_document};

type Documents = BTreeMap<ExpenseId, ExpenseRecord>;

/// Callback receiving full snapshots of the collection
pub type SnapshotObserver = Arc<dyn Fn(&[Expense]) + Send + Sync>;

#[derive(Default)]
struct ObserverRegistry {
    next_id: u64,
    observers: BTreeMap<u64, SnapshotObserver>,
}

/// Handle for a live subscription; dropping it unregisters the observer
#[must_use = "dropping a Subscription unregisters its observer"]
pub struct Subscription {
    registry: Weak<Mutex<ObserverRegistry>>,
    id: u64,
}

impl Subscription {
    /// Stop receiving snapshots
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.lock() {
                registry.observers.remove(&self.id);
            }
        }
    }
}

/// Repository for one user's expense documents
pub struct ExpenseRepository {
    user: UserId,
    path: PathBuf,
    documents: RwLock<Documents>,
    observers: Arc<Mutex<ObserverRegistry>>,
}

impl ExpenseRepository {
    /// Create a new repository for `user` backed by `path`
    pub fn new(user: UserId, path: PathBuf) -> Self {
        Self {
            user,
            path,
            documents: RwLock::new(Documents::new()),
            observers: Arc::new(Mutex::new(ObserverRegistry::default())),
        }
    }

    /// The user this collection belongs to
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Load documents from disk
    pub fn load(&self) -> TallyResult<()> {
        let file_data = self.read_file()?;
        *self.write_lock()? = file_data;
        Ok(())
    }

    /// Re-read the file and notify observers if another writer changed it
    pub fn reload(&self) -> TallyResult<bool> {
        let file_data = self.read_file()?;
        {
            let mut documents = self.write_lock()?;
            if *documents == file_data {
                return Ok(false);
            }
            *documents = file_data;
        }
        self.notify()?;
        Ok(true)
    }

    /// All expenses, ordered by category (case-insensitive) then id
    pub fn list(&self) -> TallyResult<Vec<Expense>> {
        let documents = self.read_lock()?;
        Ok(snapshot(&documents))
    }

    /// Get an expense by ID
    pub fn get(&self, id: ExpenseId) -> TallyResult<Option<Expense>> {
        let documents = self.read_lock()?;
        Ok(documents
            .get(&id)
            .map(|record| Expense::new(id, record.clone())))
    }

    /// Get an expense by category label (case-insensitive)
    pub fn get_by_category(&self, category: &str) -> TallyResult<Option<Expense>> {
        let wanted = category.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .find(|e| e.record.category.to_lowercase() == wanted))
    }

    /// Count documents
    pub fn count(&self) -> TallyResult<usize> {
        Ok(self.read_lock()?.len())
    }

    /// Store a new document under a freshly assigned id
    pub fn add(&self, record: ExpenseRecord) -> TallyResult<Expense> {
        let id = ExpenseId::new();
        let stored = record.clone();
        self.commit(move |documents| {
            documents.insert(id, stored);
        })?;
        tracing::debug!(user = %self.user, expense = %id, "expense document added");
        Ok(Expense::new(id, record))
    }

    /// Replace (or create) the document with `id`, returning the previous one
    pub fn set(&self, id: ExpenseId, record: ExpenseRecord) -> TallyResult<Option<ExpenseRecord>> {
        let previous = self.commit(move |documents| documents.insert(id, record))?;
        tracing::debug!(user = %self.user, expense = %id, "expense document written");
        Ok(previous)
    }

    /// Delete the document with `id`, returning it if it existed
    pub fn delete(&self, id: ExpenseId) -> TallyResult<Option<ExpenseRecord>> {
        let removed = self.commit(move |documents| documents.remove(&id))?;
        if removed.is_some() {
            tracing::debug!(user = %self.user, expense = %id, "expense document deleted");
        }
        Ok(removed)
    }

    /// Delete every document and the collection file itself
    pub fn delete_all(&self) -> TallyResult<Vec<Expense>> {
        let removed = {
            let mut documents = self.write_lock()?;
            let on_disk = self.read_file()?;
            remove_document(&self.path)?;
            documents.clear();
            snapshot(&on_disk)
        };
        self.notify()?;
        Ok(removed)
    }

    /// Register an observer; it is called at once with the current snapshot
    pub fn subscribe<F>(&self, observer: F) -> TallyResult<Subscription>
    where
        F: Fn(&[Expense]) + Send + Sync + 'static,
    {
        let observer: SnapshotObserver = Arc::new(observer);
        let id = {
            let mut registry = self.registry_lock()?;
            let id = registry.next_id;
            registry.next_id += 1;
            registry.observers.insert(id, observer.clone());
            id
        };

        observer(&self.list()?);

        Ok(Subscription {
            registry: Arc::downgrade(&self.observers),
            id,
        })
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> TallyResult<usize> {
        Ok(self.registry_lock()?.observers.len())
    }

    /// Apply `change` to the documents currently on disk, persist them, then
    /// swap them in and notify
    ///
    /// If the read or the write fails the in-memory documents are left as
    /// they were.
    fn commit<R>(&self, change: impl FnOnce(&mut Documents) -> R) -> TallyResult<R> {
        let (result, changed) = {
            let mut documents = self.write_lock()?;
            let on_disk = self.read_file()?;
            let mut updated = on_disk.clone();
            let result = change(&mut updated);
            if updated != on_disk {
                write_document(&self.path, &updated)?;
            }
            let changed = *documents != updated;
            *documents = updated;
            (result, changed)
        };
        if changed {
            self.notify()?;
        }
        Ok(result)
    }

    fn read_file(&self) -> TallyResult<Documents> {
        Ok(read_document(&self.path)?.unwrap_or_default())
    }

    fn notify(&self) -> TallyResult<()> {
        let observers: Vec<SnapshotObserver> =
            self.registry_lock()?.observers.values().cloned().collect();
        if observers.is_empty() {
            return Ok(());
        }

        let expenses = self.list()?;
        for observer in observers {
            observer(&expenses);
        }
        Ok(())
    }

    fn read_lock(&self) -> TallyResult<std::sync::RwLockReadGuard<'_, Documents>> {
        self.documents
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_lock(&self) -> TallyResult<std::sync::RwLockWriteGuard<'_, Documents>> {
        self.documents
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn registry_lock(&self) -> TallyResult<std::sync::MutexGuard<'_, ObserverRegistry>> {
        self.observers
            .lock()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire observer lock: {}", e)))
    }
}

fn snapshot(documents: &Documents) -> Vec<Expense> {
    let mut list: Vec<_> = documents
        .iter()
        .map(|(id, record)| Expense::new(*id, record.clone()))
        .collect();
    list.sort_by(|a, b| {
        a.record
            .category
            .to_lowercase()
            .cmp(&b.record.category.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ExpenseRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users").join("u1").join("expenses.json");
        let repo = ExpenseRepository::new(UserId::new("u1").unwrap(), path);
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_add_assigns_id_and_persists() {
        let (temp_dir, repo) = create_test_repo();
        let expense = repo.add(ExpenseRecord::new("Rent", dec!(1200))).unwrap();

        let path = temp_dir.path().join("users").join("u1").join("expenses.json");
        let reopened = ExpenseRepository::new(UserId::new("u1").unwrap(), path);
        reopened.load().unwrap();

        let loaded = reopened.get(expense.id).unwrap().unwrap();
        assert_eq!(loaded.record, expense.record);
    }

    #[test]
    fn test_list_sorted_by_category() {
        let (_temp_dir, repo) = create_test_repo();
        repo.add(ExpenseRecord::new("rent", dec!(1))).unwrap();
        repo.add(ExpenseRecord::new("Food", dec!(2))).unwrap();
        repo.add(ExpenseRecord::new("gas", dec!(3))).unwrap();

        let names: Vec<_> = repo
            .list()
            .unwrap()
            .into_iter()
            .map(|e| e.record.category)
            .collect();
        assert_eq!(names, vec!["Food", "gas", "rent"]);
    }

    #[test]
    fn test_set_and_delete() {
        let (_temp_dir, repo) = create_test_repo();
        let expense = repo.add(ExpenseRecord::new("Food", dec!(10))).unwrap();

        let mut updated = expense.record.clone();
        updated.debit_charges.push(dec!(-2));
        let previous = repo.set(expense.id, updated.clone()).unwrap();
        assert_eq!(previous, Some(expense.record.clone()));
        assert_eq!(repo.get(expense.id).unwrap().unwrap().record, updated);

        assert_eq!(repo.delete(expense.id).unwrap(), Some(updated));
        assert!(repo.get(expense.id).unwrap().is_none());
        assert_eq!(repo.delete(expense.id).unwrap(), None);
    }

    #[test]
    fn test_get_by_category() {
        let (_temp_dir, repo) = create_test_repo();
        let expense = repo.add(ExpenseRecord::new("Groceries", dec!(10))).unwrap();
        let found = repo.get_by_category("groceries").unwrap().unwrap();
        assert_eq!(found.id, expense.id);
        assert!(repo.get_by_category("Rent").unwrap().is_none());
    }

    #[test]
    fn test_subscription_receives_full_snapshots() {
        let (_temp_dir, repo) = create_test_repo();
        repo.add(ExpenseRecord::new("Food", dec!(10))).unwrap();

        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = repo
            .subscribe(move |expenses| sink.lock().unwrap().push(expenses.len()))
            .unwrap();

        let second = repo.add(ExpenseRecord::new("Rent", dec!(5))).unwrap();
        repo.delete(second.id).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1]);

        drop(subscription);
        repo.add(ExpenseRecord::new("Gas", dec!(1))).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(repo.subscriber_count().unwrap(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let (_temp_dir, repo) = create_test_repo();
        let subscription = repo.subscribe(|_| {}).unwrap();
        assert_eq!(repo.subscriber_count().unwrap(), 1);
        subscription.unsubscribe();
        assert_eq!(repo.subscriber_count().unwrap(), 0);
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let path = temp_dir.path().join("users").join("u1").join("expenses.json");
        let other = ExpenseRepository::new(UserId::new("u1").unwrap(), path);
        other.add(ExpenseRecord::new("Food", dec!(1))).unwrap();

        assert!(repo.reload().unwrap());
        assert_eq!(repo.count().unwrap(), 1);
        assert!(!repo.reload().unwrap());
    }

    #[test]
    fn test_writers_sharing_a_file_keep_each_others_documents() {
        let (temp_dir, first) = create_test_repo();
        let path = temp_dir.path().join("users").join("u1").join("expenses.json");
        let second = ExpenseRepository::new(UserId::new("u1").unwrap(), path.clone());
        first.load().unwrap();
        second.load().unwrap();

        let food = first.add(ExpenseRecord::new("Food", dec!(100))).unwrap();
        let rent = second.add(ExpenseRecord::new("Rent", dec!(1200))).unwrap();
        assert_eq!(second.count().unwrap(), 2);

        // A stale copy in `first` must not drop Rent when Food changes
        let mut charged = food.record.clone();
        charged.debit_charges.push(dec!(-5));
        first.set(food.id, charged.clone()).unwrap();

        let reopened = ExpenseRepository::new(UserId::new("u1").unwrap(), path);
        reopened.load().unwrap();
        assert_eq!(reopened.get(food.id).unwrap().unwrap().record, charged);
        assert_eq!(reopened.get(rent.id).unwrap().unwrap().record, rent.record);
    }

    #[test]
    fn test_delete_of_externally_removed_document_is_none() {
        let (temp_dir, first) = create_test_repo();
        let path = temp_dir.path().join("users").join("u1").join("expenses.json");
        let expense = first.add(ExpenseRecord::new("Food", dec!(1))).unwrap();

        let second = ExpenseRepository::new(UserId::new("u1").unwrap(), path);
        second.load().unwrap();
        assert!(second.delete(expense.id).unwrap().is_some());

        assert_eq!(first.delete(expense.id).unwrap(), None);
        assert_eq!(first.count().unwrap(), 0);
    }

    #[test]
    fn test_largest_amount_survives_the_file() {
        let (temp_dir, repo) = create_test_repo();
        let mut record = ExpenseRecord::new("Savings", crate::models::MAX_AMOUNT);
        record.debit_charges.push(dec!(-0.01));
        record.credit_charges.push(dec!(123456789012.34));
        let expense = repo.add(record).unwrap();

        let path = temp_dir.path().join("users").join("u1").join("expenses.json");
        let reopened = ExpenseRepository::new(UserId::new("u1").unwrap(), path);
        reopened.load().unwrap();

        let loaded = reopened.get(expense.id).unwrap().unwrap();
        assert_eq!(loaded.record.amount, dec!(999999999999.99));
        assert_eq!(loaded.record.debit_charges, vec![dec!(-0.01)]);
        assert_eq!(loaded.record.credit_charges, vec![dec!(123456789012.34)]);
    }

    #[test]
    fn test_failed_write_leaves_documents_unchanged() {
        let (temp_dir, repo) = create_test_repo();
        let expense = repo.add(ExpenseRecord::new("Food", dec!(10))).unwrap();

        // A directory where the collection file should be makes the commit fail
        let path = temp_dir.path().join("users").join("u1").join("expenses.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        let mut updated = expense.record.clone();
        updated.debit_charges.push(dec!(-1));
        assert!(repo.set(expense.id, updated).is_err());
        assert_eq!(repo.get(expense.id).unwrap().unwrap().record, expense.record);
    }

    #[test]
    fn test_delete_all() {
        let (temp_dir, repo) = create_test_repo();
        repo.add(ExpenseRecord::new("Food", dec!(10))).unwrap();
        repo.add(ExpenseRecord::new("Rent", dec!(10))).unwrap();

        let removed = repo.delete_all().unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(repo.count().unwrap(), 0);
        assert!(!temp_dir
            .path()
            .join("users")
            .join("u1")
            .join("expenses.json")
            .exists());
    }
}
