//! Audit hook for storage operations
//!
//! The platform maintains an audit trail of administrative actions. The
//! engine reports uploads and deletions through this trait without depending
//! on the trail's persistence. Auditing is best-effort: callers swallow and
//! log failures, they never fail the primary operation over them.

use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record an action with optional actor and structured details.
    async fn record(
        &self,
        action: &str,
        actor_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Result<(), String>;
}

/// No-op implementation for deployments without an audit trail.
pub struct NoOpAuditLog;

#[async_trait]
impl AuditLog for NoOpAuditLog {
    async fn record(
        &self,
        _action: &str,
        _actor_id: Option<Uuid>,
        _details: serde_json::Value,
    ) -> Result<(), String> {
        Ok(())
    }
}
