//! Mission persistence
//!
//! The [`MissionStore`] trait is the data-access seam the service layer is
//! written against: a PostgreSQL implementation for the real system and an
//! in-memory implementation for tests and local development.
//!
//! The store never computes anything. It persists a mission row together
//! with one distribution row per beneficiary share, and the monthly recap
//! reads back the already-computed amounts.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::{DbError, MayPgExecutor, PgExecutor};
use crate::finance::{DistributionShare, MissionCalculationResult, MissionFinancials};

/// Schema for missions and their distribution rows
pub const SCHEMA_SQL: &str = include_str!("../migrations/0001_create_kdekom_schema.sql");

/// Store error type
#[derive(Debug)]
pub enum StoreError {
    /// Underlying database error
    Db(DbError),
    /// A mission with the same reference already exists
    DuplicateReference(String),
    /// The recap period is not a valid calendar month
    InvalidPeriod { year: i32, month: u32 },
    /// Other store errors
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(e) => write!(f, "Database error: {e}"),
            StoreError::DuplicateReference(r) => {
                write!(f, "Mission reference '{r}' already exists")
            }
            StoreError::InvalidPeriod { year, month } => {
                write!(f, "Invalid recap period: {year}-{month:02}")
            }
            StoreError::Other(s) => write!(f, "Store error: {s}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::Db(err)
    }
}

/// A mission ready to persist: inputs, shares, and the computed breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMission {
    pub reference: String,
    pub mission_date: NaiveDate,
    pub financials: MissionFinancials,
    pub shares: Vec<DistributionShare>,
    pub result: MissionCalculationResult,
}

/// A persisted mission, as returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMission {
    pub id: Uuid,
    pub reference: String,
    pub mission_date: NaiveDate,
    pub financials: MissionFinancials,
    pub shares: Vec<DistributionShare>,
    pub result: MissionCalculationResult,
    pub created_at: DateTime<Utc>,
}

/// One line of the monthly recap: a beneficiary's total for the month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapLine {
    pub beneficiary_id: String,
    pub total_amount: Decimal,
}

/// Trait for mission persistence
///
/// Injected into the service layer so request handling never touches a
/// shared global connection.
pub trait MissionStore {
    /// Persist a mission row plus one distribution row per share, atomically
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateReference` if the mission reference is
    /// already taken, or `StoreError::Db` on database failure.
    fn create_mission(&self, mission: NewMission) -> Result<StoredMission, StoreError>;

    /// Aggregate persisted distribution amounts by beneficiary for one month
    ///
    /// Reads already-computed amounts; never re-runs the calculator.
    /// Lines are ordered by beneficiary identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPeriod` for an impossible year/month, or
    /// `StoreError::Db` on database failure.
    fn monthly_recap(&self, year: i32, month: u32) -> Result<Vec<RecapLine>, StoreError>;
}

/// Half-open date range covering one calendar month
fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), StoreError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(StoreError::InvalidPeriod { year, month })?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(StoreError::InvalidPeriod { year, month })?;
    Ok((start, end))
}

const INSERT_MISSION_SQL: &str = r#"
    INSERT INTO missions (
        id, reference, mission_date,
        billed_amount, initial_fees, agency_fees, fixed_fees, management_fees,
        ml_amount, lt_amount, apporteur_commission, has_sponsor,
        remainder_after_initial, remainder_before_commissions,
        sponsor_commission, base_for_distribution, reliquat, created_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
"#;

const INSERT_DISTRIBUTION_SQL: &str = r#"
    INSERT INTO mission_distributions (id, mission_id, beneficiary_id, percentage, amount)
    VALUES ($1, $2, $3, $4, $5)
"#;

const MONTHLY_RECAP_SQL: &str = r#"
    SELECT d.beneficiary_id, SUM(d.amount) AS total_amount
    FROM mission_distributions d
    JOIN missions m ON m.id = d.mission_id
    WHERE m.mission_date >= $1 AND m.mission_date < $2
    GROUP BY d.beneficiary_id
    ORDER BY d.beneficiary_id
"#;

/// PostgreSQL implementation of [`MissionStore`]
pub struct PgMissionStore {
    executor: MayPgExecutor,
}

impl PgMissionStore {
    /// Create a store over an executor
    pub fn new(executor: MayPgExecutor) -> Self {
        Self { executor }
    }

    /// Create the missions schema if it does not exist
    ///
    /// Executes the embedded migration, statement by statement. Safe to call
    /// repeatedly: every statement is `IF NOT EXISTS`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Db` if a DDL statement fails.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA_SQL.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            self.executor.execute(statement, &[])?;
        }
        Ok(())
    }

    fn reference_taken(&self, txn: &impl PgExecutor, reference: &str) -> Result<bool, StoreError> {
        let row = txn.query_one(
            "SELECT EXISTS(SELECT 1 FROM missions WHERE reference = $1)",
            &[&reference],
        )?;
        row.try_get(0)
            .map_err(|e| StoreError::Db(DbError::ParseError(format!("reference check: {e}"))))
    }
}

impl MissionStore for PgMissionStore {
    fn create_mission(&self, mission: NewMission) -> Result<StoredMission, StoreError> {
        let txn = self.executor.begin()?;

        if self.reference_taken(&txn, &mission.reference)? {
            return Err(StoreError::DuplicateReference(mission.reference));
        }

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let f = &mission.financials;
        let r = &mission.result;

        txn.execute(
            INSERT_MISSION_SQL,
            &[
                &id,
                &mission.reference,
                &mission.mission_date,
                &f.billed_amount,
                &f.initial_fees,
                &f.agency_fees,
                &f.fixed_fees,
                &f.management_fees,
                &f.ml_amount,
                &f.lt_amount,
                &f.apporteur_commission,
                &f.has_sponsor,
                &r.remainder_after_initial,
                &r.remainder_before_commissions,
                &r.sponsor_commission,
                &r.base_for_distribution,
                &r.reliquat,
                &created_at,
            ],
        )?;

        for (share, amount) in mission.shares.iter().zip(r.amounts.iter()) {
            let row_id = Uuid::new_v4();
            txn.execute(
                INSERT_DISTRIBUTION_SQL,
                &[
                    &row_id,
                    &id,
                    &share.beneficiary_id,
                    &share.percentage,
                    &amount.amount,
                ],
            )?;
        }

        txn.commit()?;

        Ok(StoredMission {
            id,
            reference: mission.reference,
            mission_date: mission.mission_date,
            financials: mission.financials,
            shares: mission.shares,
            result: mission.result,
            created_at,
        })
    }

    fn monthly_recap(&self, year: i32, month: u32) -> Result<Vec<RecapLine>, StoreError> {
        let (start, end) = month_bounds(year, month)?;

        let rows = self.executor.query_all(MONTHLY_RECAP_SQL, &[&start, &end])?;
        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let beneficiary_id: String = row
                .try_get("beneficiary_id")
                .map_err(|e| StoreError::Db(DbError::ParseError(format!("beneficiary_id: {e}"))))?;
            let total_amount: Decimal = row
                .try_get("total_amount")
                .map_err(|e| StoreError::Db(DbError::ParseError(format!("total_amount: {e}"))))?;
            lines.push(RecapLine {
                beneficiary_id,
                total_amount,
            });
        }
        Ok(lines)
    }
}

/// In-memory implementation of [`MissionStore`]
///
/// Used by unit and integration tests; no database required. Mirrors the
/// PostgreSQL store's behavior, including reference uniqueness and recap
/// aggregation over already-computed amounts.
#[derive(Default)]
pub struct MemoryMissionStore {
    missions: Mutex<Vec<StoredMission>>,
}

impl MemoryMissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted missions
    pub fn mission_count(&self) -> usize {
        self.missions.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Number of persisted distribution rows across all missions
    pub fn distribution_row_count(&self) -> usize {
        self.missions
            .lock()
            .map(|m| m.iter().map(|s| s.result.amounts.len()).sum())
            .unwrap_or(0)
    }
}

impl MissionStore for MemoryMissionStore {
    fn create_mission(&self, mission: NewMission) -> Result<StoredMission, StoreError> {
        let mut missions = self
            .missions
            .lock()
            .map_err(|_| StoreError::Other("mission state lock poisoned".to_string()))?;

        if missions.iter().any(|m| m.reference == mission.reference) {
            return Err(StoreError::DuplicateReference(mission.reference));
        }

        let stored = StoredMission {
            id: Uuid::new_v4(),
            reference: mission.reference,
            mission_date: mission.mission_date,
            financials: mission.financials,
            shares: mission.shares,
            result: mission.result,
            created_at: Utc::now(),
        };
        missions.push(stored.clone());
        Ok(stored)
    }

    fn monthly_recap(&self, year: i32, month: u32) -> Result<Vec<RecapLine>, StoreError> {
        let (start, end) = month_bounds(year, month)?;

        let missions = self
            .missions
            .lock()
            .map_err(|_| StoreError::Other("mission state lock poisoned".to_string()))?;

        let mut totals: std::collections::BTreeMap<String, Decimal> = std::collections::BTreeMap::new();
        for mission in missions.iter() {
            if mission.mission_date < start || mission.mission_date >= end {
                continue;
            }
            for amount in &mission.result.amounts {
                *totals.entry(amount.beneficiary_id.clone()).or_insert(Decimal::ZERO) +=
                    amount.amount;
            }
        }

        Ok(totals
            .into_iter()
            .map(|(beneficiary_id, total_amount)| RecapLine {
                beneficiary_id,
                total_amount,
            })
            .collect())
    }
}
