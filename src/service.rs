//! Mission service
//!
//! Orchestrates the mission-creation flow: validate the raw payload, run the
//! revenue-distribution calculator, persist the mission and its distribution
//! rows through the injected [`MissionStore`].

use chrono::Utc;
use std::fmt;

use crate::finance::{self, MissionCalculationResult};
use crate::store::{MissionStore, NewMission, RecapLine, StoreError, StoredMission};
use crate::validate::{MissionPayload, ValidationError};

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Service error type
#[derive(Debug)]
pub enum ServiceError {
    /// Payload failed boundary validation
    Validation(ValidationError),
    /// Persistence failed
    Store(StoreError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(e) => write!(f, "Validation error: {e}"),
            ServiceError::Store(e) => write!(f, "Store error: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

/// Mission-creation and recap service over an injected store
///
/// The store is passed in explicitly rather than read from module state, so
/// handlers can run concurrently against whatever data-access implementation
/// the caller wires up.
pub struct MissionService<S: MissionStore> {
    store: S,
}

impl<S: MissionStore> MissionService<S> {
    /// Create a service over a store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a mission: validate, compute the breakdown, persist
    ///
    /// The mission date defaults to the current day when the payload omits it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a missing reference or invalid
    /// shares, `ServiceError::Store` if persistence fails.
    pub fn create_mission(&self, payload: &MissionPayload) -> Result<StoredMission, ServiceError> {
        let reference = payload.validated_reference()?;
        let shares = payload.validated_shares()?;
        let financials = payload.to_financials();
        let mission_date = payload.mission_date.unwrap_or_else(|| Utc::now().date_naive());

        let result = self.compute_instrumented(&financials, &shares);

        #[cfg(feature = "tracing")]
        tracing::info!(
            reference = %reference,
            base_for_distribution = %result.base_for_distribution,
            reliquat = %result.reliquat,
            shares = shares.len(),
            "mission breakdown computed"
        );

        let stored = self.store.create_mission(NewMission {
            reference,
            mission_date,
            financials,
            shares,
            result,
        })?;

        #[cfg(feature = "metrics")]
        METRICS.record_mission_created();

        Ok(stored)
    }

    /// Recompute a breakdown from a payload without persisting anything
    ///
    /// Used when a mission is edited in the back office and the figures need
    /// refreshing before the user confirms.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the shares are invalid. The
    /// reference is not required here: the calculation is payload-only.
    pub fn recalculate(&self, payload: &MissionPayload) -> Result<MissionCalculationResult, ServiceError> {
        let shares = payload.validated_shares()?;
        let financials = payload.to_financials();
        Ok(self.compute_instrumented(&financials, &shares))
    }

    /// Monthly recap: per-beneficiary totals over persisted distribution rows
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` on persistence failure or an invalid period.
    pub fn monthly_recap(&self, year: i32, month: u32) -> Result<Vec<RecapLine>, ServiceError> {
        Ok(self.store.monthly_recap(year, month)?)
    }

    fn compute_instrumented(
        &self,
        financials: &crate::finance::MissionFinancials,
        shares: &[crate::finance::DistributionShare],
    ) -> MissionCalculationResult {
        #[cfg(feature = "metrics")]
        {
            let start = std::time::Instant::now();
            let result = finance::compute(financials, shares);
            METRICS.record_calculation_duration(start.elapsed());
            result
        }
        #[cfg(not(feature = "metrics"))]
        finance::compute(financials, shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryMissionStore;
    use rust_decimal_macros::dec;

    fn service() -> MissionService<MemoryMissionStore> {
        MissionService::new(MemoryMissionStore::new())
    }

    #[test]
    fn test_create_mission_computes_and_persists() {
        let service = service();
        let payload: MissionPayload = serde_json::from_str(
            r#"{
                "reference": "M-2026-001",
                "missionDate": "2026-07-15",
                "billedAmount": 10000,
                "initialFees": 500,
                "agencyFees": 200,
                "fixedFees": 100,
                "managementFees": 150,
                "mlAmount": 50,
                "ltAmount": 50,
                "apporteurCommission": 300,
                "hasSponsor": true,
                "shares": [
                    {"beneficiaryId": "A", "percentage": 0.10},
                    {"beneficiaryId": "B", "percentage": 0.05}
                ]
            }"#,
        )
        .unwrap();

        let stored = service.create_mission(&payload).unwrap();

        assert_eq!(stored.result.base_for_distribution, dec!(8202.50));
        assert_eq!(stored.result.sponsor_commission, dec!(447.50));
        assert_eq!(stored.result.amounts[1].amount, dec!(410.13));
        assert_eq!(service.store().mission_count(), 1);
        assert_eq!(service.store().distribution_row_count(), 2);
    }

    #[test]
    fn test_create_mission_requires_reference() {
        let service = service();
        let payload: MissionPayload = serde_json::from_str(r#"{"billedAmount": 1000}"#).unwrap();

        let err = service.create_mission(&payload).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::MissingReference)
        ));
    }

    #[test]
    fn test_create_mission_propagates_duplicate_reference() {
        let service = service();
        let payload: MissionPayload = serde_json::from_str(
            r#"{"reference": "M-1", "missionDate": "2026-07-15", "billedAmount": 1000}"#,
        )
        .unwrap();

        service.create_mission(&payload).unwrap();
        let err = service.create_mission(&payload).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::DuplicateReference(_))
        ));
    }

    #[test]
    fn test_recalculate_does_not_persist() {
        let service = service();
        let payload: MissionPayload = serde_json::from_str(
            r#"{"billedAmount": 1000, "hasSponsor": true}"#,
        )
        .unwrap();

        let result = service.recalculate(&payload).unwrap();

        assert_eq!(result.sponsor_commission, dec!(50.00));
        assert_eq!(service.store().mission_count(), 0);
    }

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::Validation(ValidationError::MissingReference);
        assert!(err.to_string().contains("Validation error"));

        let err = ServiceError::Store(StoreError::Other("down".to_string()));
        assert!(err.to_string().contains("Store error"));
    }
}
