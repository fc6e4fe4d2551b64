//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserId;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Types of documents that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Expense,
    Profile,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Expense => write!(f, "Expense"),
            EntityType::Profile => write!(f, "Profile"),
        }
    }
}

/// A single audit log entry
///
/// `before` is set for updates and deletes, `after` for creates and updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    /// Owner of the affected document
    pub user: UserId,

    pub operation: Operation,

    pub entity_type: EntityType,

    pub entity_id: String,

    /// Human-readable label, e.g. the expense category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// What the user did, e.g. "reset" or "rollover"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn base(
        user: &UserId,
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user: user.clone(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            action: None,
            before: None,
            after: None,
            diff_summary: None,
        }
    }

    pub fn create<T: Serialize>(
        user: &UserId,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            after: serde_json::to_value(entity).ok(),
            ..Self::base(user, Operation::Create, entity_type, entity_id, entity_name)
        }
    }

    pub fn update<T: Serialize>(
        user: &UserId,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Self {
        let before = serde_json::to_value(before).ok();
        let after = serde_json::to_value(after).ok();
        let diff_summary = match (&before, &after) {
            (Some(b), Some(a)) => super::diff::generate_diff(b, a),
            _ => None,
        };

        Self {
            before,
            after,
            diff_summary,
            ..Self::base(user, Operation::Update, entity_type, entity_id, entity_name)
        }
    }

    pub fn delete<T: Serialize>(
        user: &UserId,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            before: serde_json::to_value(entity).ok(),
            ..Self::base(user, Operation::Delete, entity_type, entity_id, entity_name)
        }
    }

    /// Tag the entry with the user-facing action that caused it
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.user,
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(action) = &self.action {
            output.push_str(&format!(" via {}", action));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[test]
    fn test_create_entry() {
        let data = json!({"category": "Rent", "amount": 1200});
        let entry = AuditEntry::create(
            &user(),
            EntityType::Expense,
            "exp-12345678",
            Some("Rent".to_string()),
            &data,
        );

        assert_eq!(entry.operation, Operation::Create);
        assert_eq!(entry.user, user());
        assert!(entry.before.is_none());
        assert!(entry.after.is_some());
    }

    #[test]
    fn test_update_entry_computes_diff() {
        let before = json!({"category": "Rent", "debitCharges": [-100]});
        let after = json!({"category": "Rent", "debitCharges": []});

        let entry = AuditEntry::update(
            &user(),
            EntityType::Expense,
            "exp-12345678",
            None,
            &before,
            &after,
        )
        .with_action("reset");

        assert_eq!(entry.operation, Operation::Update);
        assert_eq!(entry.action.as_deref(), Some("reset"));
        assert_eq!(
            entry.diff_summary.as_deref(),
            Some("debitCharges: [-100] -> []")
        );
    }

    #[test]
    fn test_delete_entry() {
        let entry = AuditEntry::delete(
            &user(),
            EntityType::Profile,
            "u1",
            None,
            &json!({"firstName": "Ada"}),
        );

        assert_eq!(entry.operation, Operation::Delete);
        assert!(entry.before.is_some());
        assert!(entry.after.is_none());
    }

    #[test]
    fn test_serialization() {
        let entry = AuditEntry::create(&user(), EntityType::Expense, "exp-1", None, &json!({}));

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: AuditEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.operation, Operation::Create);
        assert_eq!(deserialized.entity_type, EntityType::Expense);
        assert_eq!(deserialized.user, user());
    }

    #[test]
    fn test_human_readable_format() {
        let entry = AuditEntry::create(
            &user(),
            EntityType::Expense,
            "exp-12345678",
            Some("Groceries".to_string()),
            &json!({}),
        )
        .with_action("add");

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("u1 CREATE Expense exp-12345678"));
        assert!(formatted.contains("(Groceries)"));
        assert!(formatted.contains("via add"));
    }
}
