//! Audit logging interface.
//!
//! Every operation reports its outcome through [`AuditLog`]; decryption
//! and secure-delete failures additionally raise security events. Sinks
//! are fire-and-forget: recording never returns an error into the calling
//! operation.

use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Outcome status attached to an operation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Warning,
    Error,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Success => write!(f, "SUCCESS"),
            OperationStatus::Warning => write!(f, "WARNING"),
            OperationStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Severity of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatLevel::Info => write!(f, "INFO"),
            ThreatLevel::Warning => write!(f, "WARNING"),
            ThreatLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Sink for operation outcomes and security events.
pub trait AuditLog: Send + Sync {
    /// Record the outcome of an operation.
    fn record_operation(&self, name: &str, details: &Value, status: OperationStatus);

    /// Record a security-relevant event.
    fn record_security_event(&self, name: &str, threat_level: ThreatLevel, details: &Value);
}

impl<A: AuditLog> AuditLog for Arc<A> {
    fn record_operation(&self, name: &str, details: &Value, status: OperationStatus) {
        (**self).record_operation(name, details, status);
    }

    fn record_security_event(&self, name: &str, threat_level: ThreatLevel, details: &Value) {
        (**self).record_security_event(name, threat_level, details);
    }
}

/// Default sink emitting structured `tracing` events under the
/// `shroud::audit` and `shroud::security` targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn record_operation(&self, name: &str, details: &Value, status: OperationStatus) {
        match status {
            OperationStatus::Success => {
                tracing::info!(target: "shroud::audit", operation = name, %details, "operation completed");
            }
            OperationStatus::Warning => {
                tracing::warn!(target: "shroud::audit", operation = name, %details, "operation warning");
            }
            OperationStatus::Error => {
                tracing::error!(target: "shroud::audit", operation = name, %details, "operation failed");
            }
        }
    }

    fn record_security_event(&self, name: &str, threat_level: ThreatLevel, details: &Value) {
        match threat_level {
            ThreatLevel::Info => {
                tracing::info!(target: "shroud::security", event = name, %details, "security event");
            }
            ThreatLevel::Warning => {
                tracing::warn!(target: "shroud::security", event = name, %details, "security event");
            }
            ThreatLevel::Error => {
                tracing::error!(target: "shroud::security", event = name, %details, "security event");
            }
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudit;

impl AuditLog for NullAudit {
    fn record_operation(&self, _name: &str, _details: &Value, _status: OperationStatus) {}

    fn record_security_event(&self, _name: &str, _threat_level: ThreatLevel, _details: &Value) {}
}

/// In-memory sink capturing records, for inspection in tests.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    operations: Mutex<Vec<(String, OperationStatus)>>,
    security_events: Mutex<Vec<(String, ThreatLevel)>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded operation names and statuses, in order.
    pub fn operations(&self) -> Vec<(String, OperationStatus)> {
        self.operations.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Recorded security event names and threat levels, in order.
    pub fn security_events(&self) -> Vec<(String, ThreatLevel)> {
        self.security_events
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

impl AuditLog for MemoryAudit {
    fn record_operation(&self, name: &str, _details: &Value, status: OperationStatus) {
        if let Ok(mut operations) = self.operations.lock() {
            operations.push((name.to_string(), status));
        }
    }

    fn record_security_event(&self, name: &str, threat_level: ThreatLevel, _details: &Value) {
        if let Ok(mut events) = self.security_events.lock() {
            events.push((name.to_string(), threat_level));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_audit_captures_records() {
        let audit = MemoryAudit::new();
        audit.record_operation("TEST_OP", &json!({"k": 1}), OperationStatus::Success);
        audit.record_security_event("TEST_EVENT", ThreatLevel::Warning, &json!({}));

        assert_eq!(
            audit.operations(),
            vec![("TEST_OP".to_string(), OperationStatus::Success)]
        );
        assert_eq!(
            audit.security_events(),
            vec![("TEST_EVENT".to_string(), ThreatLevel::Warning)]
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(OperationStatus::Warning.to_string(), "WARNING");
        assert_eq!(ThreatLevel::Error.to_string(), "ERROR");
    }
}
