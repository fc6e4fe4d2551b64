//! User profile documents
//!
//! One `profile.json` per user directory. Profiles are small and rarely
//! touched, so they are read from disk on every access.

use crate::config::paths::TallyPaths;
use crate::error::TallyResult;
use crate::models::{UserId, UserProfile};

use super::file_io::{read_document, remove_document, write_document};

/// Repository for profile persistence
pub struct ProfileRepository {
    paths: TallyPaths,
}

impl ProfileRepository {
    pub fn new(paths: TallyPaths) -> Self {
        Self { paths }
    }

    /// Get a user's profile
    pub fn get(&self, user: &UserId) -> TallyResult<Option<UserProfile>> {
        read_document(&self.paths.profile_file(user))
    }

    /// Create or overwrite a user's profile
    pub fn set(&self, user: &UserId, profile: &UserProfile) -> TallyResult<()> {
        write_document(&self.paths.profile_file(user), profile)
    }

    /// Delete a user's profile, returning whether one existed
    pub fn delete(&self, user: &UserId) -> TallyResult<bool> {
        remove_document(&self.paths.profile_file(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_profile_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = ProfileRepository::new(TallyPaths::with_base_dir(temp_dir.path().to_path_buf()));
        let user = UserId::new("u1").unwrap();

        assert!(repo.get(&user).unwrap().is_none());

        let profile = UserProfile::from_identity(Some("Ada Lovelace"), None, None);
        repo.set(&user, &profile).unwrap();
        assert_eq!(repo.get(&user).unwrap(), Some(profile));

        assert!(repo.delete(&user).unwrap());
        assert!(repo.get(&user).unwrap().is_none());
        assert!(!repo.delete(&user).unwrap());
    }
}
