// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for security-sensitive operations.
//!
//! Logins, logouts, recipe writes and user administration are appended to a
//! daily JSONL file under `audit/{date}/events.jsonl`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DocumentStore, StorageError, StorageResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Auth events
    AuthSuccess,
    AuthFailure,
    Logout,

    // Recipe events
    RecipeCreated,
    RecipeUpdated,
    RecipeDeleted,

    // Admin events
    UserRolesChanged,
    UserActivationChanged,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    pub user_id: Option<String>,
    /// Resource type (recipe, user, ...).
    pub resource_type: Option<String>,
    /// Resource affected.
    pub resource_id: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_type: None,
            resource_id: None,
            details: None,
            success: true,
            error: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> AuditRepository<'a> {
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    /// Append an event to its day's log.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format(DATE_FORMAT).to_string();
        let path = self.storage.paths().audit_events_file(&date);

        let line = serde_json::to_string(event).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize audit event: {e}"))
        })?;
        self.storage.append_line(path, &line)
    }

    /// Log and swallow failures. Auditing never fails the request.
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.log(&event) {
            tracing::warn!(
                error = %e,
                event_type = ?event.event_type,
                "Failed to write audit event"
            );
        }
    }

    /// Read audit events for a single `YYYY-MM-DD` date. Corrupt lines are skipped.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.storage.paths().audit_events_file(date);
        let content = self.storage.read_to_string(path)?;

        let mut events = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(
                    date,
                    line = index + 1,
                    error = %e,
                    "Skipping unreadable audit event"
                ),
            }
        }
        Ok(events)
    }

    /// Read events for an inclusive date range. Days without a log are skipped.
    pub fn read_events_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> StorageResult<Vec<AuditEvent>> {
        let start = parse_date(start_date, "start")?;
        let end = parse_date(end_date, "end")?;

        let mut all_events = Vec::new();
        let mut current = start;
        while current <= end {
            let date_str = current.format(DATE_FORMAT).to_string();
            match self.read_events(&date_str) {
                Ok(events) => all_events.extend(events),
                Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            current = current
                .succ_opt()
                .ok_or_else(|| StorageError::SerializationError("Date overflow".to_string()))?;
        }

        Ok(all_events)
    }
}

fn parse_date(value: &str, which: &str) -> StorageResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| StorageError::SerializationError(format!("Invalid {which} date: {e}")))
}

/// Record an audit event for an authenticated actor.
#[macro_export]
macro_rules! audit_log {
    ($storage:expr, $event_type:expr, $user:expr) => {{
        let event = $crate::storage::AuditEvent::new($event_type).with_user(&$user.user_id);
        $crate::storage::AuditRepository::new($storage).record(event);
    }};
    ($storage:expr, $event_type:expr, $user:expr, $resource_type:expr, $resource_id:expr) => {{
        let event = $crate::storage::AuditEvent::new($event_type)
            .with_user(&$user.user_id)
            .with_resource($resource_type, $resource_id);
        $crate::storage::AuditRepository::new($storage).record(event);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DocumentStore) {
        let temp = TempDir::new().unwrap();
        let mut storage = DocumentStore::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    fn today() -> String {
        Utc::now().format(DATE_FORMAT).to_string()
    }

    #[test]
    fn failed_event() {
        let event = AuditEvent::new(AuditEventType::AuthFailure)
            .with_details(serde_json::json!({ "reason": "didToken invalid." }))
            .failed("Unauthorized");

        assert!(!event.success);
        assert_eq!(event.error, Some("Unauthorized".to_string()));
        assert!(event.user_id.is_none());
    }

    #[test]
    fn log_and_read_events() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);

        repo.log(
            &AuditEvent::new(AuditEventType::RecipeCreated)
                .with_user("user_1")
                .with_resource("recipe", "r1"),
        )
        .unwrap();
        repo.log(&AuditEvent::new(AuditEventType::Logout)).unwrap();

        let events = repo.read_events(&today()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::RecipeCreated);
        assert_eq!(events[0].resource_id.as_deref(), Some("r1"));
        assert_eq!(events[1].event_type, AuditEventType::Logout);
    }

    #[test]
    fn range_skips_days_without_logs() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);
        repo.record(AuditEvent::new(AuditEventType::AuthSuccess).with_user("u"));

        let yesterday = (Utc::now() - chrono::Duration::days(1))
            .format(DATE_FORMAT)
            .to_string();
        let events = repo.read_events_range(&yesterday, &today()).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn invalid_range_date_is_rejected() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);
        assert!(matches!(
            repo.read_events_range("yesterday", "2024-01-01"),
            Err(StorageError::SerializationError(_))
        ));
    }

    #[test]
    fn macro_records_actor_and_resource() {
        struct Actor {
            user_id: String,
        }
        let (_temp, storage) = setup();
        let actor = Actor {
            user_id: "admin_1".to_string(),
        };

        audit_log!(&storage, AuditEventType::UserRolesChanged, actor, "user", "u2");

        let events = AuditRepository::new(&storage).read_events(&today()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_id.as_deref(), Some("admin_1"));
        assert_eq!(events[0].resource_type.as_deref(), Some("user"));
    }

    #[test]
    fn corrupt_line_does_not_hide_the_day() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);
        repo.log(&AuditEvent::new(AuditEventType::Logout)).unwrap();
        storage
            .append_line(storage.paths().audit_events_file(&today()), "{\"truncated\":")
            .unwrap();
        repo.log(&AuditEvent::new(AuditEventType::AuthSuccess)).unwrap();

        let events = repo.read_events(&today()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, AuditEventType::AuthSuccess);
    }

    #[test]
    fn concurrent_recording_stays_readable() {
        let (_temp, storage) = setup();

        std::thread::scope(|scope| {
            for worker in 0..16 {
                let storage = &storage;
                scope.spawn(move || {
                    let repo = AuditRepository::new(storage);
                    for i in 0..200 {
                        repo.log(
                            &AuditEvent::new(AuditEventType::RecipeUpdated)
                                .with_user(format!("user_{worker}"))
                                .with_resource("recipe", format!("r{i}")),
                        )
                        .unwrap();
                    }
                });
            }
        });

        let events = AuditRepository::new(&storage).read_events(&today()).unwrap();
        assert_eq!(events.len(), 16 * 200);
    }
}
