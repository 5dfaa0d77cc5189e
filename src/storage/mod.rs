// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Everything lives under the configured data directory:
//!
//! ```text
//! {DATA_DIR}/
//!   recipes/
//!     {recipe_id}.json     # One document per recipe
//!   users.redb             # User records + email index (redb)
//!   audit/
//!     {date}/events.jsonl  # Daily audit logs
//! ```

pub mod audit;
pub mod document_store;
pub mod ownership;
pub mod paths;
pub mod repository;
pub mod users;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use document_store::{DocumentStore, StorageError, StorageResult};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use paths::StoragePaths;
pub use repository::RecipeRepository;
#[cfg(test)]
pub use users::MockUserStore;
pub use users::{ensure_admin, UserDatabase, UserDbError, UserDbResult, UserStore};
