//! Boundary validation for mission payloads
//!
//! The surrounding system submits loosely-typed JSON bodies (and
//! spreadsheet-shaped rows mapped to the same shape by the import tooling).
//! This module turns those into the strongly-typed [`finance`](crate::finance)
//! inputs before the calculator runs.
//!
//! Monetary fields follow the system's default policy: a missing, null, or
//! non-numeric value coerces to zero rather than rejecting the payload.
//! Numeric strings ("1234.56") are accepted because the legacy front end
//! sometimes sends amounts as strings.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;

use crate::finance::{DistributionShare, MissionFinancials};

/// Validation error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The mission reference is missing or empty
    MissingReference,
    /// A share has a missing or empty beneficiary identifier
    MissingBeneficiaryId { index: usize },
    /// The same beneficiary appears more than once in one mission
    DuplicateBeneficiary(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingReference => {
                write!(f, "Mission reference is required")
            }
            ValidationError::MissingBeneficiaryId { index } => {
                write!(f, "Share at index {} has no beneficiary identifier", index)
            }
            ValidationError::DuplicateBeneficiary(id) => {
                write!(f, "Beneficiary '{}' appears more than once", id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Deserialize a monetary field, coercing anything non-numeric to zero
///
/// Accepts JSON numbers (integer or float), numeric strings, and null.
/// Missing fields are handled by `#[serde(default)]` on the payload structs.
///
/// # Examples
///
/// ```rust,ignore
/// // number      -> 1234.56
/// // "1234.56"   -> 1234.56
/// // null        -> 0
/// // "n/a"       -> 0
/// ```
pub fn coerce_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Decimal;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, a numeric string, or null")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            // Non-finite floats have no Decimal representation; coerce to 0
            Ok(Decimal::from_f64(value).unwrap_or(Decimal::ZERO))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::from(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::from(value))
        }

        fn visit_str<E>(self, value: &str) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO))
        }

        fn visit_none<E>(self) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::ZERO)
        }

        fn visit_unit<E>(self) -> Result<Decimal, E>
        where
            E: de::Error,
        {
            Ok(Decimal::ZERO)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

/// Raw mission creation payload, as received from the HTTP layer
///
/// Field names mirror the JSON body the front end sends (camelCase).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPayload {
    #[serde(default)]
    pub reference: String,
    /// Defaults to the current day when absent
    #[serde(default)]
    pub mission_date: Option<chrono::NaiveDate>,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub billed_amount: Decimal,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub initial_fees: Decimal,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub agency_fees: Decimal,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub fixed_fees: Decimal,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub management_fees: Decimal,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub ml_amount: Decimal,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub lt_amount: Decimal,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub apporteur_commission: Decimal,
    #[serde(default)]
    pub has_sponsor: bool,
    #[serde(default)]
    pub shares: Vec<SharePayload>,
}

/// One beneficiary share as submitted by the caller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    #[serde(default)]
    pub beneficiary_id: String,
    #[serde(default, deserialize_with = "coerce_amount")]
    pub percentage: Decimal,
}

impl MissionPayload {
    /// Validate and trim the mission reference
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingReference` if empty or whitespace.
    pub fn validated_reference(&self) -> Result<String, ValidationError> {
        let reference = self.reference.trim();
        if reference.is_empty() {
            return Err(ValidationError::MissingReference);
        }
        Ok(reference.to_string())
    }

    /// Extract the calculator's monetary inputs from the payload
    pub fn to_financials(&self) -> MissionFinancials {
        MissionFinancials {
            billed_amount: self.billed_amount,
            initial_fees: self.initial_fees,
            agency_fees: self.agency_fees,
            fixed_fees: self.fixed_fees,
            management_fees: self.management_fees,
            ml_amount: self.ml_amount,
            lt_amount: self.lt_amount,
            apporteur_commission: self.apporteur_commission,
            has_sponsor: self.has_sponsor,
        }
    }

    /// Validate the submitted shares and convert them to typed shares
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a share has an empty beneficiary
    /// identifier or the same beneficiary appears twice. Percentages are not
    /// range-checked: over- and under-allocation are legitimate outcomes the
    /// calculator reports through the reliquat.
    pub fn validated_shares(&self) -> Result<Vec<DistributionShare>, ValidationError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut shares = Vec::with_capacity(self.shares.len());

        for (index, raw) in self.shares.iter().enumerate() {
            let id = raw.beneficiary_id.trim();
            if id.is_empty() {
                return Err(ValidationError::MissingBeneficiaryId { index });
            }
            if !seen.insert(id) {
                return Err(ValidationError::DuplicateBeneficiary(id.to_string()));
            }
            shares.push(DistributionShare {
                beneficiary_id: id.to_string(),
                percentage: raw.percentage,
            });
        }

        Ok(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_numeric_fields_deserialize() {
        let payload: MissionPayload = serde_json::from_str(
            r#"{
                "billedAmount": 10000,
                "initialFees": 500.5,
                "agencyFees": "200.25",
                "hasSponsor": true,
                "shares": [{"beneficiaryId": "A", "percentage": 0.10}]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.billed_amount, dec!(10000));
        assert_eq!(payload.initial_fees, dec!(500.5));
        assert_eq!(payload.agency_fees, dec!(200.25));
        assert!(payload.has_sponsor);
        assert_eq!(payload.shares[0].percentage, dec!(0.10));
    }

    #[test]
    fn test_missing_and_null_fields_coerce_to_zero() {
        let payload: MissionPayload = serde_json::from_str(
            r#"{"billedAmount": 1000, "fixedFees": null}"#,
        )
        .unwrap();

        assert_eq!(payload.billed_amount, dec!(1000));
        assert_eq!(payload.fixed_fees, Decimal::ZERO);
        assert_eq!(payload.initial_fees, Decimal::ZERO);
        assert_eq!(payload.apporteur_commission, Decimal::ZERO);
        assert!(!payload.has_sponsor);
        assert!(payload.shares.is_empty());
    }

    #[test]
    fn test_non_numeric_string_coerces_to_zero() {
        let payload: MissionPayload =
            serde_json::from_str(r#"{"billedAmount": "n/a"}"#).unwrap();
        assert_eq!(payload.billed_amount, Decimal::ZERO);
    }

    #[test]
    fn test_to_financials_carries_all_fields() {
        let payload: MissionPayload = serde_json::from_str(
            r#"{
                "billedAmount": 10000,
                "initialFees": 500,
                "agencyFees": 200,
                "fixedFees": 100,
                "managementFees": 150,
                "mlAmount": 50,
                "ltAmount": 50,
                "apporteurCommission": 300,
                "hasSponsor": true
            }"#,
        )
        .unwrap();

        let financials = payload.to_financials();
        assert_eq!(financials.billed_amount, dec!(10000));
        assert_eq!(financials.management_fees, dec!(150));
        assert_eq!(financials.lt_amount, dec!(50));
        assert!(financials.has_sponsor);
    }

    #[test]
    fn test_validated_shares_ok() {
        let payload: MissionPayload = serde_json::from_str(
            r#"{"shares": [
                {"beneficiaryId": "A", "percentage": 0.10},
                {"beneficiaryId": "B", "percentage": "0.05"}
            ]}"#,
        )
        .unwrap();

        let shares = payload.validated_shares().unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].beneficiary_id, "A");
        assert_eq!(shares[1].percentage, dec!(0.05));
    }

    #[test]
    fn test_validated_shares_rejects_empty_beneficiary() {
        let payload: MissionPayload = serde_json::from_str(
            r#"{"shares": [{"beneficiaryId": "  ", "percentage": 0.10}]}"#,
        )
        .unwrap();

        let err = payload.validated_shares().unwrap_err();
        assert_eq!(err, ValidationError::MissingBeneficiaryId { index: 0 });
        assert!(err.to_string().contains("beneficiary identifier"));
    }

    #[test]
    fn test_validated_reference() {
        let payload: MissionPayload =
            serde_json::from_str(r#"{"reference": "  M-2026-001 "}"#).unwrap();
        assert_eq!(payload.validated_reference().unwrap(), "M-2026-001");

        let payload: MissionPayload = serde_json::from_str(r#"{"reference": "  "}"#).unwrap();
        assert_eq!(
            payload.validated_reference().unwrap_err(),
            ValidationError::MissingReference
        );

        let payload: MissionPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(
            payload.validated_reference().unwrap_err(),
            ValidationError::MissingReference
        );
    }

    #[test]
    fn test_mission_date_deserializes() {
        let payload: MissionPayload =
            serde_json::from_str(r#"{"missionDate": "2026-07-15"}"#).unwrap();
        assert_eq!(
            payload.mission_date,
            chrono::NaiveDate::from_ymd_opt(2026, 7, 15)
        );
    }

    #[test]
    fn test_validated_shares_rejects_duplicates() {
        let payload: MissionPayload = serde_json::from_str(
            r#"{"shares": [
                {"beneficiaryId": "A", "percentage": 0.10},
                {"beneficiaryId": "A", "percentage": 0.05}
            ]}"#,
        )
        .unwrap();

        let err = payload.validated_shares().unwrap_err();
        assert_eq!(err, ValidationError::DuplicateBeneficiary("A".to_string()));
    }
}
