//! Connectivity reporting for single backends and the dual-write orchestrator.
//!
//! A [`StatusReport`] is computed on demand and never persisted. Probing a
//! tier never fails: a check that errors, times out or panics reports the
//! tier as disconnected.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::OpContext;
use crate::core::{BackendKind, Database, DynDatabase};

/// Upper bound on a single connectivity check.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Role of a backend inside the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Secondary,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Primary => write!(f, "primary"),
            Tier::Secondary => write!(f, "secondary"),
        }
    }
}

/// Outcome bookkeeping for one tier, updated after every delegated call.
#[derive(Debug, Clone, Default)]
pub struct TierHealth {
    /// Consecutive failed calls.
    pub consecutive_failures: u32,

    /// Last error message (if any).
    pub last_error: Option<String>,

    /// Last successful call.
    pub last_success: Option<DateTime<Utc>>,
}

impl TierHealth {
    /// Records a successful call.
    pub fn record_success(&mut self, tier: Tier) {
        if self.consecutive_failures > 0 {
            info!(
                %tier,
                failures = self.consecutive_failures,
                "Backend tier recovered"
            );
        }
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_success = Some(Utc::now());
    }

    /// Records a failed call.
    pub fn record_failure(&mut self, error: String) {
        self.consecutive_failures += 1;
        self.last_error = Some(error);
    }
}

/// Connectivity of a single tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStatus {
    pub tier: Tier,
    pub backend_kind: BackendKind,
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consecutive_failures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl TierStatus {
    pub fn new(tier: Tier, backend_kind: BackendKind, connected: bool) -> Self {
        Self {
            tier,
            backend_kind,
            connected,
            consecutive_failures: None,
            last_error: None,
        }
    }

    /// Attaches call-outcome bookkeeping to the report.
    pub fn with_health(mut self, health: &TierHealth) -> Self {
        self.consecutive_failures = Some(health.consecutive_failures);
        self.last_error = health.last_error.clone();
        self
    }
}

/// Point-in-time connectivity of every tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// When the report was computed, RFC 3339 UTC.
    #[serde(with = "rfc3339")]
    pub timestamp: DateTime<Utc>,

    /// True when the primary tier is connected. A down secondary degrades
    /// nothing.
    pub overall_ok: bool,

    pub tiers: Vec<TierStatus>,
}

impl StatusReport {
    pub fn from_tiers(tiers: Vec<TierStatus>) -> Self {
        let overall_ok = tiers
            .iter()
            .find(|t| t.tier == Tier::Primary)
            .map(|t| t.connected)
            .unwrap_or(false);

        Self {
            timestamp: Utc::now(),
            overall_ok,
            tiers,
        }
    }

    /// Status of `tier`, if it is configured.
    pub fn tier(&self, tier: Tier) -> Option<&TierStatus> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ok={}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.overall_ok
        )?;
        for tier in &self.tiers {
            write!(f, " {}({})={}", tier.tier, tier.backend_kind, tier.connected)?;
        }
        Ok(())
    }
}

/// Checks `db` in place, bounded by [`DEFAULT_CHECK_TIMEOUT`] and the
/// context deadline.
pub async fn check_connected<D: Database + ?Sized>(db: &D, ctx: &OpContext) -> bool {
    let ctx = ctx.child().deadline_in(DEFAULT_CHECK_TIMEOUT);
    let deadline = ctx.deadline().unwrap_or_else(|| tokio::time::Instant::now() + DEFAULT_CHECK_TIMEOUT);
    tokio::time::timeout_at(deadline, db.is_connected(&ctx))
        .await
        .unwrap_or(false)
}

/// Checks a shared handle on its own task so that a panicking check is
/// contained and reported as disconnected.
pub async fn check_isolated(db: DynDatabase, ctx: &OpContext, tier: Tier, timeout: Duration) -> bool {
    let ctx = ctx.child().deadline_in(timeout);
    let check_ctx = ctx.clone();
    let kind = db.kind();
    let handle = tokio::spawn(async move { db.is_connected(&check_ctx).await });
    let deadline = ctx.deadline().unwrap_or_else(|| tokio::time::Instant::now() + timeout);

    match tokio::time::timeout_at(deadline, handle).await {
        Ok(Ok(connected)) => connected,
        Ok(Err(join_error)) => {
            warn!(%tier, backend = %kind, error = %join_error, "Connectivity check panicked");
            false
        }
        Err(_) => {
            ctx.cancel();
            warn!(%tier, backend = %kind, "Connectivity check timed out");
            false
        }
    }
}
