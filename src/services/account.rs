//! Account lifecycle service
//!
//! Reacts to identities being created and deleted: a new identity gets a
//! profile document, a deleted one takes its profile and every expense with it.

use serde::{Deserialize, Serialize};

use crate::audit::{AuditEntry, EntityType};
use crate::error::TallyResult;
use crate::models::{UserId, UserProfile};
use crate::storage::Storage;

/// Identity as handed over by the sign-in provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }
}

/// What an account deletion removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub profile_removed: bool,
    pub expenses_removed: usize,
}

/// Service for account lifecycle events
pub struct AccountService<'a> {
    storage: &'a Storage,
}

impl<'a> AccountService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Write the profile document for a newly created identity
    pub fn on_user_created(&self, identity: &Identity) -> TallyResult<UserProfile> {
        let user = parse_uid(&identity.uid)?;
        let profile = UserProfile::from_identity(
            identity.display_name.as_deref(),
            identity.email.as_deref(),
            identity.photo_url.as_deref(),
        );

        self.storage.profiles.set(&user, &profile)?;
        self.storage.log_create(
            &user,
            EntityType::Profile,
            user.as_str(),
            Some(profile.display_name()),
            &profile,
            "signup",
        )?;
        tracing::info!(user = %user, "profile created");

        Ok(profile)
    }

    /// Remove the profile and every expense of a deleted identity
    ///
    /// Deleting an identity with no documents is not an error.
    pub fn on_user_deleted(&self, uid: &str) -> TallyResult<DeletionReport> {
        let user = parse_uid(uid)?;
        let mut entries = Vec::new();

        let expenses = self.storage.expenses(&user)?.delete_all()?;
        for expense in &expenses {
            entries.push(
                AuditEntry::delete(
                    &user,
                    EntityType::Expense,
                    expense.id.to_string(),
                    Some(expense.record.category.clone()),
                    &expense.record,
                )
                .with_action("account-deleted"),
            );
        }

        let profile = self.storage.profiles.get(&user)?;
        let profile_removed = self.storage.profiles.delete(&user)?;
        if let Some(profile) = profile {
            entries.push(
                AuditEntry::delete(
                    &user,
                    EntityType::Profile,
                    user.as_str(),
                    Some(profile.display_name()),
                    &profile,
                )
                .with_action("account-deleted"),
            );
        }

        self.storage.log_batch(&entries)?;
        self.storage.remove_user_dir(&user)?;
        tracing::info!(
            user = %user,
            expenses = expenses.len(),
            profile_removed,
            "account data removed"
        );

        Ok(DeletionReport {
            profile_removed,
            expenses_removed: expenses.len(),
        })
    }

    /// Get a user's profile
    pub fn profile(&self, user: &UserId) -> TallyResult<Option<UserProfile>> {
        self.storage.profiles.get(user)
    }
}

fn parse_uid(uid: &str) -> TallyResult<UserId> {
    UserId::new(uid).map_err(|e| crate::error::TallyError::Validation(e.to_string()))
}
