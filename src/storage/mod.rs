//! Storage layer for Tally
//!
//! A local JSON document store laid out like the hosted collection it stands
//! in for: `users/<uid>/profile.json` and `users/<uid>/expenses.json`.
//!
//! A `Storage` hands out one shared `ExpenseRepository` per user, so every
//! service in the process sees the same documents and the same observers.

pub mod expenses;
pub mod file_io;
pub mod profiles;

pub use expenses::{ExpenseRepository, SnapshotObserver, Subscription};
pub use profiles::ProfileRepository;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::TallyPaths;
use crate::error::{TallyError, TallyResult};
use crate::models::UserId;

/// Main storage coordinator: paths, profiles, per-user collections and the audit log
pub struct Storage {
    paths: TallyPaths,
    pub profiles: ProfileRepository,
    expenses: RwLock<HashMap<UserId, Arc<ExpenseRepository>>>,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: TallyPaths) -> TallyResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            profiles: ProfileRepository::new(paths.clone()),
            expenses: RwLock::new(HashMap::new()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &TallyPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// A user's expense collection, loaded on first use and shared afterwards
    pub fn expenses(&self, user: &UserId) -> TallyResult<Arc<ExpenseRepository>> {
        let cached = self
            .expenses
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?
            .get(user)
            .cloned();
        if let Some(repo) = cached {
            return Ok(repo);
        }

        let mut repos = self
            .expenses
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        if let Some(repo) = repos.get(user) {
            return Ok(repo.clone());
        }

        let repo = Arc::new(ExpenseRepository::new(
            user.clone(),
            self.paths.expenses_file(user),
        ));
        repo.load()?;
        repos.insert(user.clone(), repo.clone());
        tracing::debug!(user = %user, "expense collection opened");
        Ok(repo)
    }

    /// Whether any documents exist for `user`
    pub fn has_user_data(&self, user: &UserId) -> bool {
        self.paths.user_dir(user).exists()
    }

    /// Remove a user's (now empty) document directory
    pub fn remove_user_dir(&self, user: &UserId) -> TallyResult<()> {
        let dir = self.paths.user_dir(user);
        match std::fs::remove_dir(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "user directory left in place");
                Ok(())
            }
        }
    }

    /// Log a create operation
    pub fn log_create<T: Serialize>(
        &self,
        user: &UserId,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
        action: &str,
    ) -> TallyResult<()> {
        let entry = AuditEntry::create(user, entity_type, entity_id, entity_name, entity)
            .with_action(action);
        self.audit.log(&entry)
    }

    /// Log an update operation
    #[allow(clippy::too_many_arguments)]
    pub fn log_update<T: Serialize>(
        &self,
        user: &UserId,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        action: &str,
    ) -> TallyResult<()> {
        let entry = AuditEntry::update(user, entity_type, entity_id, entity_name, before, after)
            .with_action(action);
        self.audit.log(&entry)
    }

    /// Log a delete operation
    pub fn log_delete<T: Serialize>(
        &self,
        user: &UserId,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
        action: &str,
    ) -> TallyResult<()> {
        let entry = AuditEntry::delete(user, entity_type, entity_id, entity_name, entity)
            .with_action(action);
        self.audit.log(&entry)
    }

    /// Log several entries at once
    pub fn log_batch(&self, entries: &[AuditEntry]) -> TallyResult<()> {
        self.audit.log_batch(entries)
    }
}
