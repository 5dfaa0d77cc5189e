// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the on-disk storage layout.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_DATA_DIR;

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Recipe Paths ==========

    /// Directory containing all recipe documents.
    pub fn recipes_dir(&self) -> PathBuf {
        self.root.join("recipes")
    }

    /// Path to a specific recipe document.
    pub fn recipe(&self, recipe_id: &str) -> PathBuf {
        self.recipes_dir().join(format!("{recipe_id}.json"))
    }

    // ========== User Database ==========

    /// redb file holding user records.
    pub fn users_db(&self) -> PathBuf {
        self.root.join("users.redb")
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("./data"));
    }

    #[test]
    fn recipe_paths_are_correct() {
        let paths = StoragePaths::new("/srv/recipes");
        assert_eq!(paths.recipes_dir(), PathBuf::from("/srv/recipes/recipes"));
        assert_eq!(
            paths.recipe("r-123"),
            PathBuf::from("/srv/recipes/recipes/r-123.json")
        );
    }

    #[test]
    fn users_db_lives_at_root() {
        let paths = StoragePaths::new("/srv/recipes");
        assert_eq!(paths.users_db(), PathBuf::from("/srv/recipes/users.redb"));
    }

    #[test]
    fn audit_paths_are_correct() {
        let paths = StoragePaths::new("/srv/recipes");
        assert_eq!(paths.audit_dir(), PathBuf::from("/srv/recipes/audit"));
        assert_eq!(
            paths.audit_events_file("2026-01-31"),
            PathBuf::from("/srv/recipes/audit/2026-01-31/events.jsonl")
        );
    }
}
