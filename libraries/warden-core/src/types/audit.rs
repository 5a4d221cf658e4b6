/// Audit event types
use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sensitive or mutating operation being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    Register,
    Login,
    Update,
    Delete,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Register => "register",
            AuditOperation::Login => "login",
            AuditOperation::Update => "update",
            AuditOperation::Delete => "delete",
        }
    }
}

/// How the operation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    /// Short machine-readable reason code, e.g. `invalid_credentials`
    Failure { reason: String },
}

impl AuditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuditOutcome::Success)
    }
}

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique per event so identical operations in the same millisecond stay distinct
    pub id: Uuid,

    pub operation: AuditOperation,

    /// `user:<id>` for known users, otherwise the email that was presented
    pub subject: String,

    pub timestamp: DateTime<Utc>,

    pub outcome: AuditOutcome,
}

impl AuditEvent {
    /// Build an event stamped with the current time
    pub fn new(operation: AuditOperation, subject: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation,
            subject: subject.into(),
            timestamp: Utc::now(),
            outcome,
        }
    }

    /// Successful operation on a known user
    pub fn success(operation: AuditOperation, user_id: UserId) -> Self {
        Self::new(operation, subject_for(user_id), AuditOutcome::Success)
    }

    /// Failed operation; `subject` is whatever identified the attempt
    pub fn failure(
        operation: AuditOperation,
        subject: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            operation,
            subject,
            AuditOutcome::Failure {
                reason: reason.into(),
            },
        )
    }

    /// Ordering score used by the bounded log (epoch milliseconds)
    pub fn score(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Canonical audit subject for a user id
pub fn subject_for(user_id: UserId) -> String {
    format!("user:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_event_serializes_reason() {
        let event = AuditEvent::failure(AuditOperation::Login, "ghost@example.com", "invalid_credentials");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["operation"], "login");
        assert_eq!(json["outcome"]["status"], "failure");
        assert_eq!(json["outcome"]["reason"], "invalid_credentials");
    }

    #[test]
    fn events_get_distinct_ids() {
        let a = AuditEvent::success(AuditOperation::Delete, UserId::new(3));
        let b = AuditEvent::success(AuditOperation::Delete, UserId::new(3));
        assert_ne!(a.id, b.id);
        assert_eq!(a.subject, "user:3");
    }
}
