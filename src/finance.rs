//! Mission revenue-distribution calculator
//!
//! Computes how a mission's billed amount is allocated once fees and
//! commissions are taken out: the intermediate remainders, the optional
//! sponsor ("parrain") commission, the distributable base, the
//! per-beneficiary amounts, and the undistributed leftover ("reliquat").
//!
//! This module is pure: no state, no I/O, no side effects. One invocation
//! is fully independent of any other, so it can be called concurrently
//! from request handlers without coordination.
//!
//! All money is `rust_decimal::Decimal` (the same type the NUMERIC columns
//! bind to), so cent rounding is exact rather than float-approximate.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Flat sponsor commission rate: 5% of the remainder before commissions.
///
/// Applied unconditionally when a sponsor is attached, even when the
/// remainder is negative. The formula does not clamp at zero.
pub const SPONSOR_COMMISSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Monetary inputs of a mission, as captured at creation time.
///
/// All fields are plain amounts; the caller (the validation boundary) is
/// responsible for coercing missing or non-numeric values to zero before
/// constructing this type. Negative values are accepted: the calculator is
/// an arithmetic pass-through and never rejects finite inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionFinancials {
    /// Total amount billed to the client for the mission
    pub billed_amount: Decimal,
    /// Up-front fees deducted first
    pub initial_fees: Decimal,
    /// Agency fees
    pub agency_fees: Decimal,
    /// Fixed fees
    pub fixed_fees: Decimal,
    /// Management fees
    pub management_fees: Decimal,
    /// Named pass-through amount ("ML")
    pub ml_amount: Decimal,
    /// Named pass-through amount ("LT")
    pub lt_amount: Decimal,
    /// Commission owed to the referrer ("apporteur"), as an amount
    pub apporteur_commission: Decimal,
    /// Whether a sponsor ("parrain") is attached to the mission
    pub has_sponsor: bool,
}

/// One beneficiary's percentage share of the distributable base.
///
/// `percentage` is a fraction (0.10 for 10%). Shares are not constrained to
/// sum to 1.0: an under-allocation leaves a positive reliquat, an
/// over-allocation a negative one. Both are legitimate, reportable outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionShare {
    pub beneficiary_id: String,
    pub percentage: Decimal,
}

/// A beneficiary identifier paired with its computed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryAmount {
    pub beneficiary_id: String,
    pub amount: Decimal,
}

/// Full breakdown of a mission's revenue allocation.
///
/// Every field is rounded to 2 decimal places (round half away from zero)
/// independently, as the final step of the computation. Because each rounded
/// figure derives from the same unrounded base, the identity
/// `base_for_distribution == sum(amounts) + reliquat` holds up to one cent
/// per rounded term, not exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionCalculationResult {
    /// Billed amount minus initial fees
    pub remainder_after_initial: Decimal,
    /// Remainder after all fee and pass-through deductions
    pub remainder_before_commissions: Decimal,
    /// 5% of the remainder before commissions when a sponsor is attached, else 0
    pub sponsor_commission: Decimal,
    /// Remainder after apporteur and sponsor commissions; divided among beneficiaries
    pub base_for_distribution: Decimal,
    /// Per-beneficiary amounts, in the order the shares were given
    pub amounts: Vec<BeneficiaryAmount>,
    /// Fraction of the base not claimed by any share
    pub reliquat: Decimal,
}

/// Round a monetary value to cents, half away from zero.
fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the revenue distribution of a mission.
///
/// Deterministic, side-effect free, and total over its inputs: any finite
/// mission financials and any share list produce a fully populated result.
/// Intermediate remainders may go negative; nothing is clamped.
///
/// Step order matters: each share amount and the reliquat are derived from
/// the *unrounded* base for distribution, and every output field is rounded
/// to cents independently as the last step.
///
/// # Arguments
///
/// * `mission` - The mission's monetary inputs
/// * `shares` - Ordered beneficiary shares; order is preserved in the output
///
/// # Examples
///
/// ```
/// use kdekom::finance::{compute, DistributionShare, MissionFinancials};
/// use rust_decimal::Decimal;
///
/// let mission = MissionFinancials {
///     billed_amount: Decimal::new(10_000, 0),
///     initial_fees: Decimal::new(500, 0),
///     ..Default::default()
/// };
/// let shares = vec![DistributionShare {
///     beneficiary_id: "consultant-1".to_string(),
///     percentage: Decimal::new(10, 2), // 10%
/// }];
///
/// let result = compute(&mission, &shares);
/// assert_eq!(result.remainder_after_initial, Decimal::new(9_500_00, 2));
/// assert_eq!(result.amounts[0].amount, Decimal::new(950_00, 2));
/// ```
pub fn compute(mission: &MissionFinancials, shares: &[DistributionShare]) -> MissionCalculationResult {
    let remainder_after_initial = mission.billed_amount - mission.initial_fees;

    let remainder_before_commissions = remainder_after_initial
        - mission.agency_fees
        - mission.fixed_fees
        - mission.management_fees
        - mission.ml_amount
        - mission.lt_amount;

    // 5% flat when a sponsor is attached; deliberately unclamped when the
    // remainder is negative (the commission goes negative with it).
    let sponsor_commission = if mission.has_sponsor {
        remainder_before_commissions * SPONSOR_COMMISSION_RATE
    } else {
        Decimal::ZERO
    };

    let base_for_distribution =
        remainder_before_commissions - mission.apporteur_commission - sponsor_commission;

    // Each share and the reliquat are taken from the unrounded base, not
    // from the rounded output value.
    let amounts: Vec<BeneficiaryAmount> = shares
        .iter()
        .map(|share| BeneficiaryAmount {
            beneficiary_id: share.beneficiary_id.clone(),
            amount: round_cents(base_for_distribution * share.percentage),
        })
        .collect();

    let total_share_percentage: Decimal = shares.iter().map(|share| share.percentage).sum();
    let reliquat = round_cents(base_for_distribution * (Decimal::ONE - total_share_percentage));

    MissionCalculationResult {
        remainder_after_initial: round_cents(remainder_after_initial),
        remainder_before_commissions: round_cents(remainder_before_commissions),
        sponsor_commission: round_cents(sponsor_commission),
        base_for_distribution: round_cents(base_for_distribution),
        amounts,
        reliquat,
    }
}
