// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized User
//! - `users_by_email`: lowercase email → user_id

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::auth::Role;
use crate::models::User;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized User (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: lowercase email → user_id.
const USERS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UserDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type UserDbResult<T> = Result<T, UserDbError>;

/// User lookups needed by the login flow and the user admin endpoints.
#[cfg_attr(test, mockall::automock)]
pub trait UserStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> UserDbResult<Option<User>>;
    fn find_by_id(&self, user_id: &str) -> UserDbResult<Option<User>>;
    /// Fails with `AlreadyExists` when the id or the email is taken.
    fn insert(&self, user: &User) -> UserDbResult<()>;
    /// Fails with `NotFound` for an unknown id.
    fn update(&self, user: &User) -> UserDbResult<()>;
    fn list(&self) -> UserDbResult<Vec<User>>;
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// UserDatabase
// =============================================================================

/// Embedded ACID user database.
pub struct UserDatabase {
    db: Database,
}

impl UserDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> UserDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Verify the database can serve a read transaction.
    pub fn health_check(&self) -> UserDbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

impl UserStore for UserDatabase {
    fn find_by_email(&self, email: &str) -> UserDbResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERS_BY_EMAIL)?;
        let user_id = match index.get(email_key(email).as_str())? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_id(&self, user_id: &str) -> UserDbResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn insert(&self, user: &User) -> UserDbResult<()> {
        let json = serde_json::to_vec(user)?;
        let key = email_key(&user.email);

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut index = write_txn.open_table(USERS_BY_EMAIL)?;

            if users.get(user.id.as_str())?.is_some() {
                return Err(UserDbError::AlreadyExists(format!("user {}", user.id)));
            }
            if index.get(key.as_str())?.is_some() {
                return Err(UserDbError::AlreadyExists(format!("email {}", user.email)));
            }

            users.insert(user.id.as_str(), json.as_slice())?;
            index.insert(key.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn update(&self, user: &User) -> UserDbResult<()> {
        let json = serde_json::to_vec(user)?;
        let new_key = email_key(&user.email);

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut index = write_txn.open_table(USERS_BY_EMAIL)?;

            let previous: User = match users.get(user.id.as_str())? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(UserDbError::NotFound(format!("user {}", user.id))),
            };

            let old_key = email_key(&previous.email);
            if old_key != new_key {
                let taken = index
                    .get(new_key.as_str())?
                    .map(|owner| owner.value() != user.id)
                    .unwrap_or(false);
                if taken {
                    return Err(UserDbError::AlreadyExists(format!("email {}", user.email)));
                }
                index.remove(old_key.as_str())?;
                index.insert(new_key.as_str(), user.id.as_str())?;
            }

            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn list(&self) -> UserDbResult<Vec<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let mut users = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            users.push(serde_json::from_slice::<User>(value.value())?);
        }
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }
}

/// Make sure `email` belongs to an active admin, creating the user if needed.
pub fn ensure_admin(store: &dyn UserStore, email: &str) -> UserDbResult<User> {
    let Some(mut user) = store.find_by_email(email)? else {
        let mut user = User::new_member(email.trim());
        user.roles = vec![Role::Admin];
        store.insert(&user)?;
        return Ok(user);
    };

    if user.has_role(Role::Admin) && user.is_active {
        return Ok(user);
    }
    if !user.roles.contains(&Role::Admin) {
        user.roles.push(Role::Admin);
    }
    user.is_active = true;
    user.updated_at = chrono::Utc::now();
    store.update(&user)?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_db() -> (TempDir, UserDatabase) {
        let dir = TempDir::new().unwrap();
        let db = UserDatabase::open(&dir.path().join("users.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn insert_and_find() {
        let (_dir, db) = open_db();
        let user = User::new_member("Chef@Example.com");
        db.insert(&user).unwrap();

        assert_eq!(db.find_by_id(&user.id).unwrap(), Some(user.clone()));
        assert_eq!(db.find_by_email("chef@example.com").unwrap(), Some(user.clone()));
        assert_eq!(db.find_by_email(" CHEF@example.COM ").unwrap(), Some(user));
        assert!(db.find_by_email("nobody@example.com").unwrap().is_none());
        db.health_check().unwrap();
    }

    #[test]
    fn insert_rejects_duplicate_email() {
        let (_dir, db) = open_db();
        db.insert(&User::new_member("a@example.com")).unwrap();

        let err = db.insert(&User::new_member("A@example.com")).unwrap_err();
        assert!(matches!(err, UserDbError::AlreadyExists(_)));
        assert_eq!(db.list().unwrap().len(), 1);
    }

    #[test]
    fn update_unknown_user_is_not_found() {
        let (_dir, db) = open_db();
        let err = db.update(&User::new_member("ghost@example.com")).unwrap_err();
        assert!(matches!(err, UserDbError::NotFound(_)));
    }

    #[test]
    fn update_moves_email_index() {
        let (_dir, db) = open_db();
        let mut user = User::new_member("old@example.com");
        db.insert(&user).unwrap();

        user.email = "new@example.com".to_string();
        user.roles = vec![Role::Admin];
        user.is_active = false;
        db.update(&user).unwrap();

        assert!(db.find_by_email("old@example.com").unwrap().is_none());
        let found = db.find_by_email("new@example.com").unwrap().unwrap();
        assert_eq!(found.roles, vec![Role::Admin]);
        assert!(!found.is_active);
    }

    #[test]
    fn update_rejects_email_of_other_user() {
        let (_dir, db) = open_db();
        let first = User::new_member("first@example.com");
        let mut second = User::new_member("second@example.com");
        db.insert(&first).unwrap();
        db.insert(&second).unwrap();

        second.email = "first@example.com".to_string();
        assert!(matches!(
            db.update(&second).unwrap_err(),
            UserDbError::AlreadyExists(_)
        ));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.redb");
        let user = User::new_member("persist@example.com");
        {
            let db = UserDatabase::open(&path).unwrap();
            db.insert(&user).unwrap();
        }
        let db = UserDatabase::open(&path).unwrap();
        assert_eq!(db.list().unwrap(), vec![user]);
    }

    #[test]
    fn ensure_admin_creates_missing_user() {
        let (_dir, db) = open_db();
        let admin = ensure_admin(&db, "boss@example.com").unwrap();

        assert_eq!(admin.roles, vec![Role::Admin]);
        assert!(admin.is_active);
        assert_eq!(db.find_by_email("boss@example.com").unwrap(), Some(admin));
    }

    #[test]
    fn ensure_admin_promotes_and_reactivates_existing_user() {
        let (_dir, db) = open_db();
        let mut user = User::new_member("cook@example.com");
        user.is_active = false;
        db.insert(&user).unwrap();

        let admin = ensure_admin(&db, "cook@example.com").unwrap();
        assert_eq!(admin.id, user.id);
        assert!(admin.is_active);
        assert_eq!(admin.roles, vec![Role::Member, Role::Admin]);
        assert_eq!(db.list().unwrap().len(), 1);
    }
}
