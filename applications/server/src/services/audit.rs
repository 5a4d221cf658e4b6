/// Bounded audit log over the cache backend
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use warden_core::{AuditEvent, CacheBackend, CacheResult, LogBounds};

fn decode(entry: &str) -> CacheResult<AuditEvent> {
    Ok(serde_json::from_str(entry)?)
}

/// Append-only record of identity operations
///
/// Entries live in one scored log under `key`. Each append trims the log to
/// `max_entries` and drops anything older than `retention`, so the log never
/// grows without bound. Recording is best-effort: a cache outage loses the
/// event but never fails the operation being audited.
#[derive(Clone)]
pub struct AuditLog {
    backend: Arc<dyn CacheBackend>,
    key: String,
    max_entries: usize,
    retention: Duration,
}

impl AuditLog {
    pub fn new(
        backend: Arc<dyn CacheBackend>,
        key: impl Into<String>,
        max_entries: usize,
        retention: Duration,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            max_entries,
            retention,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn cutoff_millis(&self) -> i64 {
        let retention_ms = i64::try_from(self.retention.as_millis()).unwrap_or(i64::MAX);
        Utc::now().timestamp_millis().saturating_sub(retention_ms)
    }

    /// Append an event, logging instead of failing when the cache is unusable
    pub async fn record(&self, event: AuditEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(audit_id = %event.id, "Audit event encode failed: {}", e);
                return;
            }
        };

        let bounds = LogBounds {
            max_len: self.max_entries,
            min_score: self.cutoff_millis(),
            ttl: self.retention,
        };

        match self
            .backend
            .append_bounded(&self.key, &payload, event.score(), bounds)
            .await
        {
            Ok(()) => tracing::debug!(
                operation = event.operation.as_str(),
                subject = %event.subject,
                success = event.outcome.is_success(),
                "Audit event recorded"
            ),
            Err(e) => tracing::error!(
                operation = event.operation.as_str(),
                subject = %event.subject,
                "Audit event dropped: {}",
                e
            ),
        }
    }

    /// Newest-first events still inside the retention window
    ///
    /// Entries that no longer decode are skipped.
    pub async fn recent(&self, limit: usize) -> CacheResult<Vec<AuditEvent>> {
        let cutoff = self.cutoff_millis();
        let raw = self.backend.recent(&self.key, cutoff, limit).await?;

        let events = raw
            .iter()
            .filter_map(|entry| match decode(entry) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!("Skipping unreadable audit entry: {}", e);
                    None
                }
            })
            .filter(|event| event.score() >= cutoff)
            .collect();

        Ok(events)
    }
}
