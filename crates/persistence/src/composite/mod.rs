//! Dual-write storage.
//!
//! # Overview
//!
//! A single logical backend built from a required primary and an optional
//! secondary:
//!
//! | Operation | Primary | Secondary |
//! |-----------|---------|-----------|
//! | `insert` | written, result returned | written concurrently, failure logged |
//! | `all`, `find_by_field` | read | never read |
//! | `delete` | deleted | untouched |
//! | `status` | checked, decides `overall_ok` | checked, reported |
//!
//! # Design Principles
//!
//! 1. **Primary is authoritative**: the caller only ever sees the primary's
//!    data and the primary's write result.
//!
//! 2. **Best-effort mirror**: the secondary is a write-only replica. There is
//!    no cross-backend transaction and no repair of missed writes.
//!
//! 3. **Graceful Degradation**: a secondary that is down at startup or at
//!    write time never makes a request fail.

mod health;
mod storage;

pub use health::{
    DEFAULT_CHECK_TIMEOUT, StatusReport, Tier, TierHealth, TierStatus, check_connected,
    check_isolated,
};
pub use storage::DualWriteStorage;
