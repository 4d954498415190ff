//! # KDEKOM
//!
//! Mission revenue-distribution engine and PostgreSQL data access for the
//! KDEKOM back-office.
//!
//! The core is [`finance::compute`]: a pure function turning a mission's
//! monetary inputs and a list of beneficiary shares into the full breakdown
//! of remainders, commissions, per-beneficiary amounts, and the undistributed
//! reliquat. Around it sit the boundary validation for loosely-typed
//! payloads, the [`store`] persistence layer over `may_postgres`, and the
//! [`service`] orchestrating the mission-creation flow.

pub mod config;
pub mod db;
pub mod finance;
#[cfg(feature = "tracing")]
pub mod logging;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod service;
pub mod store;
pub mod validate;

pub use config::{AppConfig, DatabaseConfig};
pub use db::{connect, DbError, MayPgExecutor, PgExecutor, Txn};
pub use finance::{
    compute, BeneficiaryAmount, DistributionShare, MissionCalculationResult, MissionFinancials,
};
pub use service::{MissionService, ServiceError};
pub use store::{
    MemoryMissionStore, MissionStore, NewMission, PgMissionStore, RecapLine, StoreError,
    StoredMission,
};
pub use validate::{MissionPayload, SharePayload, ValidationError};
