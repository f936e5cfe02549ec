//! Security event log.
//!
//! An append-only, capped ring buffer of security happenings: failed
//! logins, lockouts, rate-limit denials, CSRF rejections, token rotation
//! and reuse. The log is bounded at a configured maximum; the oldest
//! events are evicted silently once the cap is reached, so it is an
//! operational window, not a durable audit store.
//!
//! The log is handed to consumers as an `Arc` injected at construction,
//! never a global singleton, so tests get isolated instances.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::storage::EventLogConfig;

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    LoginFailed,
    LoginSucceeded,
    AccountLocked,
    AccountUnlocked,
    RateLimitExceeded,
    CsrfRejected,
    TokenRotated,
    TokenReuseDetected,
    MfaVerified,
    MfaRejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// One recorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub kind: SecurityEventKind,
    pub severity: Severity,
    pub message: String,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Filter for [`SecurityEventLog::events`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub kind: Option<SecurityEventKind>,
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn kind(mut self, kind: SecurityEventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Capped in-memory event log.
pub struct SecurityEventLog {
    events: RwLock<VecDeque<SecurityEvent>>,
    max_events: usize,
}

impl Default for SecurityEventLog {
    fn default() -> Self {
        Self::new(EventLogConfig::default())
    }
}

impl SecurityEventLog {
    pub fn new(config: EventLogConfig) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            max_events: config.max_events,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_events
    }

    /// Append an event, evicting the oldest entry if the log is full.
    pub async fn log(
        &self,
        kind: SecurityEventKind,
        severity: Severity,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) -> SecurityEvent {
        let event = SecurityEvent {
            id: Uuid::new_v4(),
            kind,
            severity,
            message: message.into(),
            metadata,
            timestamp: Utc::now(),
        };

        let mut events = self.events.write().await;
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event.clone());
        drop(events);

        match severity {
            Severity::Info => tracing::info!(kind = ?kind, "{}", event.message),
            Severity::Warning => tracing::warn!(kind = ?kind, "{}", event.message),
            Severity::Error | Severity::Critical => {
                tracing::error!(kind = ?kind, severity = ?severity, "{}", event.message)
            }
        }

        event
    }

    /// Events newest-first, optionally filtered.
    pub async fn events(&self, filter: EventFilter) -> Vec<SecurityEvent> {
        let events = self.events.read().await;
        let iter = events
            .iter()
            .rev()
            .filter(|e| filter.kind.is_none_or(|k| e.kind == k))
            .filter(|e| filter.severity.is_none_or(|s| e.severity == s))
            .cloned();

        match filter.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}
