//! User profile document
//!
//! Written once when an identity is created and removed with the account.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, rename = "photoURL")]
    pub photo_url: String,
}

impl UserProfile {
    /// Build a profile from identity-provider fields
    ///
    /// The display name is split on single spaces; the first two pieces become
    /// the first and last name and anything after them is dropped.
    pub fn from_identity(
        display_name: Option<&str>,
        email: Option<&str>,
        photo_url: Option<&str>,
    ) -> Self {
        let mut parts = display_name.unwrap_or_default().split(' ');
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.next().unwrap_or_default().to_string();

        Self {
            first_name,
            last_name,
            email: email.unwrap_or_default().to_string(),
            photo_url: photo_url.unwrap_or_default().to_string(),
        }
    }

    /// "First Last", or whichever half is present
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
