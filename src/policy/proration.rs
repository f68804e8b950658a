//! Policy period proration
//!
//! Spreads a policy amount over the calendar quarters its coverage period
//! touches. Every day in `[start, end)` carries the same share of the total,
//! so a quarter's amount is simply `days * total / total_days`.

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::quarter::Quarter;
use crate::numeric::{self, AmountError, INVALID_AMOUNT_MESSAGE};

/// Deductible share of passenger car expenses (the remaining 30% is KKEG)
pub const DEFAULT_DEDUCTIBLE_SHARE: f64 = 0.70;

/// Raw form input for one proration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PolicyPeriodInput {
    /// First covered day
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Day after the last covered day
    #[serde(default)]
    pub end: Option<NaiveDate>,

    /// Locale-formatted total (e.g. "1.000,00")
    #[serde(default)]
    pub total_amount: String,

    /// Apply the deductible / non-deductible split
    #[serde(default)]
    pub is_passenger_car: bool,
}

/// Validation failures, in the order they are checked
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyPeriodError {
    #[error("Lütfen başlangıç ve bitiş tarihlerini seçin.")]
    MissingDates,

    #[error("Bitiş tarihi, başlangıç tarihinden sonra olmalıdır.")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("{}", INVALID_AMOUNT_MESSAGE)]
    InvalidAmount(#[from] AmountError),

    #[error("Tutar, kuruş hassasiyetinde hesaplanamayacak kadar büyük.")]
    AmountOutOfRange(f64),
}

/// Input that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_amount: f64,
    pub is_passenger_car: bool,
}

/// How a passenger car amount divides into deductible and non-deductible parts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeductionSplit {
    pub deductible_share: f64,
}

impl DeductionSplit {
    pub fn new(deductible_share: f64) -> Self {
        Self { deductible_share }
    }

    /// Returns (deductible, non_deductible)
    pub fn apply(&self, amount: f64) -> (f64, f64) {
        (
            amount * self.deductible_share,
            amount * (1.0 - self.deductible_share),
        )
    }
}

impl Default for DeductionSplit {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUCTIBLE_SHARE)
    }
}

/// Prorated slice of the total for one quarter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyPeriodResult {
    pub quarter: Quarter,
    pub days: u32,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deductible: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_deductible: Option<f64>,
}

/// Totals row shown under the per-quarter breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolicyPeriodSummary {
    pub total_days: u32,
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_deductible: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_non_deductible: Option<f64>,
}

impl PolicyPeriodSummary {
    /// Sum the breakdown. Split totals are present only when every entry has a split.
    pub fn from_results(results: &[PolicyPeriodResult]) -> Self {
        let total_days = results.iter().map(|r| r.days).sum();
        let total_amount = results.iter().map(|r| r.amount).sum();

        let has_split = !results.is_empty()
            && results
                .iter()
                .all(|r| r.deductible.is_some() && r.non_deductible.is_some());

        let (total_deductible, total_non_deductible) = if has_split {
            (
                Some(results.iter().filter_map(|r| r.deductible).sum()),
                Some(results.iter().filter_map(|r| r.non_deductible).sum()),
            )
        } else {
            (None, None)
        };

        Self {
            total_days,
            total_amount,
            total_deductible,
            total_non_deductible,
        }
    }
}

/// Check the form input: dates present, start before end, then a positive amount
pub fn validate(input: &PolicyPeriodInput) -> Result<ValidatedPeriod, PolicyPeriodError> {
    let (start, end) = match (input.start, input.end) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(PolicyPeriodError::MissingDates),
    };

    if start >= end {
        return Err(PolicyPeriodError::InvalidRange { start, end });
    }

    let total_amount = numeric::parse_amount_field(&input.total_amount)?;

    Ok(ValidatedPeriod {
        start,
        end,
        total_amount,
        is_passenger_car: input.is_passenger_car,
    })
}

/// Distribute `total_amount` over the quarters touched by `[start, end)`.
///
/// Returns one entry per quarter in chronological order. An empty or
/// inverted range yields no entries.
pub fn prorate(
    start: NaiveDate,
    end: NaiveDate,
    total_amount: f64,
    split: Option<DeductionSplit>,
) -> Vec<PolicyPeriodResult> {
    let total_days = (end - start).num_days();
    if total_days <= 0 {
        return Vec::new();
    }

    let daily_amount = total_amount / total_days as f64;

    let mut days_per_quarter: BTreeMap<Quarter, u32> = BTreeMap::new();
    for day in start.iter_days().take_while(|d| *d < end) {
        *days_per_quarter.entry(Quarter::of(day)).or_insert(0) += 1;
    }

    days_per_quarter
        .into_iter()
        .map(|(quarter, days)| {
            let amount = days as f64 * daily_amount;
            let (deductible, non_deductible) = match split {
                Some(split) => {
                    let (d, n) = split.apply(amount);
                    (Some(d), Some(n))
                }
                None => (None, None),
            };

            PolicyPeriodResult {
                quarter,
                days,
                amount,
                deductible,
                non_deductible,
            }
        })
        .collect()
}

/// Validate the form input and prorate it, optionally rounding the
/// breakdown to whole cents with [`reconcile_to_cents`]
pub fn calculate(
    input: &PolicyPeriodInput,
    split: DeductionSplit,
    reconcile_cents: bool,
) -> Result<Vec<PolicyPeriodResult>, PolicyPeriodError> {
    let period = validate(input).map_err(|e| {
        log::debug!("policy period input rejected: {:?}", e);
        e
    })?;

    let mut results = prorate(
        period.start,
        period.end,
        period.total_amount,
        period.is_passenger_car.then_some(split),
    );

    log::debug!(
        "prorated {:.2} over {} -> {} into {} quarter(s)",
        period.total_amount,
        period.start,
        period.end,
        results.len()
    );

    if reconcile_cents {
        reconcile_to_cents(&mut results, period.total_amount, split)?;
    }

    Ok(results)
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Round every entry to whole cents so the amounts add up to `total_amount`
/// exactly. Half cents round away from zero.
///
/// The rounding residual goes to the entry with the most days (the latest
/// one on ties). Split entries are recomputed from the adjusted amount, with
/// the non-deductible part taking whatever cent the deductible rounding leaves.
/// Entries are left untouched when an amount is too large for cent precision.
pub fn reconcile_to_cents(
    results: &mut [PolicyPeriodResult],
    total_amount: f64,
    split: DeductionSplit,
) -> Result<(), PolicyPeriodError> {
    if results.is_empty() {
        return Ok(());
    }

    let out_of_range = || PolicyPeriodError::AmountOutOfRange(total_amount);

    let total = to_decimal(total_amount).map(round_cents).ok_or_else(out_of_range)?;
    let share = to_decimal(split.deductible_share).ok_or_else(out_of_range)?;

    let mut amounts = results
        .iter()
        .map(|r| to_decimal(r.amount).map(round_cents))
        .collect::<Option<Vec<Decimal>>>()
        .ok_or_else(out_of_range)?;

    let allocated = amounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(*a))
        .ok_or_else(out_of_range)?;
    let residual = total.checked_sub(allocated).ok_or_else(out_of_range)?;

    if !residual.is_zero() {
        // max_by_key keeps the last of equal elements
        if let Some((idx, _)) = results.iter().enumerate().max_by_key(|(_, r)| r.days) {
            log::debug!("assigning {} residual to {}", residual, results[idx].quarter);
            amounts[idx] = amounts[idx].checked_add(residual).ok_or_else(out_of_range)?;
        }
    }

    let mut parts = Vec::with_capacity(amounts.len());
    for (result, amount) in results.iter().zip(&amounts) {
        let part = match result.deductible {
            Some(_) => {
                let deductible = amount.checked_mul(share).map(round_cents).ok_or_else(out_of_range)?;
                let non_deductible = amount.checked_sub(deductible).ok_or_else(out_of_range)?;
                Some((deductible, non_deductible))
            }
            None => None,
        };
        parts.push(part);
    }

    for ((result, amount), part) in results.iter_mut().zip(amounts).zip(parts) {
        result.amount = to_f64(amount);
        if let Some((deductible, non_deductible)) = part {
            result.deductible = Some(to_f64(deductible));
            result.non_deductible = Some(to_f64(non_deductible));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(start: Option<NaiveDate>, end: Option<NaiveDate>, amount: &str) -> PolicyPeriodInput {
        PolicyPeriodInput {
            start,
            end,
            total_amount: amount.to_string(),
            is_passenger_car: false,
        }
    }

    #[test]
    fn test_single_quarter() {
        let results = prorate(date(2024, 1, 10), date(2024, 1, 20), 900.0, None);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].quarter.label(), "2024 Q1");
        assert_eq!(results[0].days, 10);
        assert_abs_diff_eq!(results[0].amount, 900.0, epsilon = 1e-9);
        assert!(results[0].deductible.is_none());
        assert!(results[0].non_deductible.is_none());
    }

    #[test]
    fn test_quarter_boundary() {
        let results = prorate(date(2024, 3, 30), date(2024, 4, 2), 300.0, None);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].quarter.label(), "2024 Q1");
        assert_eq!(results[0].days, 2);
        assert_abs_diff_eq!(results[0].amount, 200.0, epsilon = 1e-9);
        assert_eq!(results[1].quarter.label(), "2024 Q2");
        assert_eq!(results[1].days, 1);
        assert_abs_diff_eq!(results[1].amount, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_year_boundary_is_chronological() {
        let results = prorate(date(2023, 12, 30), date(2024, 1, 2), 30.0, None);

        let labels: Vec<String> = results.iter().map(|r| r.quarter.label()).collect();
        assert_eq!(labels, vec!["2023 Q4", "2024 Q1"]);
        assert_eq!(results[0].days, 2);
        assert_eq!(results[1].days, 1);
    }

    #[test]
    fn test_leap_year_has_no_weighting() {
        // 2024 is a leap year: 366 days, Q1 has 91 of them
        let results = prorate(date(2024, 1, 1), date(2025, 1, 1), 366.0, None);

        let days: Vec<u32> = results.iter().map(|r| r.days).collect();
        assert_eq!(days, vec![91, 91, 92, 92]);
        for r in &results {
            assert_abs_diff_eq!(r.amount, r.days as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_totals_are_preserved() {
        let cases = [
            (date(2024, 1, 10), date(2024, 1, 20), 900.0),
            (date(2023, 11, 15), date(2024, 11, 15), 12_345.67),
            (date(2022, 2, 28), date(2025, 3, 1), 0.01),
            (date(2024, 6, 30), date(2024, 7, 1), 1_000_000.0),
        ];

        for (start, end, amount) in cases {
            let results = prorate(start, end, amount, None);
            let summary = PolicyPeriodSummary::from_results(&results);

            assert_eq!(summary.total_days as i64, (end - start).num_days());
            assert_abs_diff_eq!(summary.total_amount, amount, epsilon = amount * 1e-9);
            assert!(results.windows(2).all(|w| w[0].quarter < w[1].quarter));
            assert!(results.iter().all(|r| r.days > 0));
        }
    }

    #[test]
    fn test_passenger_car_split() {
        let results = prorate(
            date(2024, 2, 1),
            date(2024, 8, 1),
            1000.0,
            Some(DeductionSplit::default()),
        );

        assert_eq!(results.len(), 3);
        for r in &results {
            let deductible = r.deductible.unwrap();
            let non_deductible = r.non_deductible.unwrap();
            assert_abs_diff_eq!(deductible + non_deductible, r.amount, epsilon = 1e-9);
            assert_abs_diff_eq!(deductible, r.amount * 0.7, epsilon = 1e-9);
            assert_abs_diff_eq!(non_deductible, r.amount * 0.3, epsilon = 1e-9);
        }

        let summary = PolicyPeriodSummary::from_results(&results);
        assert_abs_diff_eq!(summary.total_deductible.unwrap(), 700.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.total_non_deductible.unwrap(), 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_range_is_noop() {
        assert!(prorate(date(2024, 1, 1), date(2024, 1, 1), 100.0, None).is_empty());
        assert!(prorate(date(2024, 2, 1), date(2024, 1, 1), 100.0, None).is_empty());
    }

    #[test]
    fn test_validation_order() {
        let start = Some(date(2024, 1, 1));
        let end = Some(date(2024, 2, 1));

        assert_eq!(validate(&input(None, end, "")), Err(PolicyPeriodError::MissingDates));
        assert_eq!(validate(&input(start, None, "100")), Err(PolicyPeriodError::MissingDates));

        // Range is checked before the amount
        let inverted = validate(&input(end, start, "abc"));
        assert!(matches!(inverted, Err(PolicyPeriodError::InvalidRange { .. })));

        let same_day = validate(&input(start, start, "100"));
        assert!(matches!(same_day, Err(PolicyPeriodError::InvalidRange { .. })));

        for amount in ["", "0", "0,00", "abc"] {
            let err = validate(&input(start, end, amount)).unwrap_err();
            assert!(matches!(err, PolicyPeriodError::InvalidAmount(_)));
            assert_eq!(err.to_string(), INVALID_AMOUNT_MESSAGE);
        }
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let messages = [
            PolicyPeriodError::MissingDates.to_string(),
            PolicyPeriodError::InvalidRange { start: date(2024, 2, 1), end: date(2024, 1, 1) }
                .to_string(),
            PolicyPeriodError::InvalidAmount(AmountError::NotPositive(0.0)).to_string(),
        ];

        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn test_calculate_applies_split_only_for_passenger_cars() {
        let mut form = input(Some(date(2024, 3, 30)), Some(date(2024, 4, 2)), "300,00");

        let plain = calculate(&form, DeductionSplit::default(), false).unwrap();
        assert!(plain.iter().all(|r| r.deductible.is_none()));

        form.is_passenger_car = true;
        let split = calculate(&form, DeductionSplit::default(), false).unwrap();
        assert_abs_diff_eq!(split[0].deductible.unwrap(), 140.0, epsilon = 1e-9);
        assert_abs_diff_eq!(split[1].non_deductible.unwrap(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_summary_of_empty_breakdown() {
        let summary = PolicyPeriodSummary::from_results(&[]);
        assert_eq!(summary.total_days, 0);
        assert_eq!(summary.total_amount, 0.0);
        assert!(summary.total_deductible.is_none());
    }

    fn entry(quarter: u8, days: u32, amount: f64, split: bool) -> PolicyPeriodResult {
        PolicyPeriodResult {
            quarter: Quarter::new(2024, quarter).unwrap(),
            days,
            amount,
            deductible: split.then_some(amount * 0.7),
            non_deductible: split.then_some(amount * 0.3),
        }
    }

    fn dec(value: f64) -> Decimal {
        Decimal::from_f64(value).unwrap()
    }

    #[test]
    fn test_reconcile_assigns_residual_to_longest_entry() {
        let third = 1.0 / 3.0;
        let mut results: Vec<PolicyPeriodResult> =
            (1..=3).map(|q| entry(q, 1, third, false)).collect();

        reconcile_to_cents(&mut results, 1.0, DeductionSplit::default()).unwrap();

        let amounts: Vec<f64> = results.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![0.33, 0.33, 0.34]);
    }

    #[test]
    fn test_reconcile_sums_to_total_in_cents() {
        let cases = [
            (date(2023, 11, 15), date(2024, 11, 15), 12_345.67),
            (date(2024, 3, 31), date(2024, 7, 2), 1.0),
            (date(2021, 1, 17), date(2024, 5, 3), 100.0),
        ];

        for (start, end, amount) in cases {
            let split = DeductionSplit::default();
            let mut results = prorate(start, end, amount, Some(split));
            reconcile_to_cents(&mut results, amount, split).unwrap();

            let total: Decimal = results.iter().map(|r| dec(r.amount)).sum();
            assert_eq!(total, dec(amount));

            for r in &results {
                let pair = dec(r.deductible.unwrap()) + dec(r.non_deductible.unwrap());
                assert_eq!(pair, dec(r.amount));
            }
        }
    }

    #[test]
    fn test_reconcile_rounds_half_cents_away_from_zero() {
        for cents in (5..100).step_by(10) {
            let amount = cents as f64 / 100.0;
            let mut results = vec![entry(1, 10, amount, true)];
            reconcile_to_cents(&mut results, amount, DeductionSplit::default()).unwrap();

            // 70% of an odd multiple of 5 cents always ends in half a cent
            let expected_deductible = (cents * 7 + 5) / 10;
            assert_eq!(
                dec(results[0].deductible.unwrap()),
                Decimal::new(expected_deductible, 2),
                "deductible part of {}",
                amount
            );
            assert_eq!(
                dec(results[0].non_deductible.unwrap()),
                Decimal::new(cents - expected_deductible, 2),
                "non-deductible part of {}",
                amount
            );
        }
    }

    #[test]
    fn test_reconcile_large_total_does_not_overflow() {
        let amount = 1e18;
        let mut results = prorate(date(2024, 1, 1), date(2025, 1, 1), amount, None);
        reconcile_to_cents(&mut results, amount, DeductionSplit::default()).unwrap();

        assert_eq!(results.len(), 4);
        let total: f64 = results.iter().map(|r| r.amount).sum();
        assert_relative_eq!(total, amount, max_relative = 1e-12);
    }

    #[test]
    fn test_reconcile_rejects_amounts_beyond_cent_precision() {
        let amount = 1e30;
        let mut results = prorate(date(2024, 1, 1), date(2025, 1, 1), amount, None);
        let before = results.clone();

        let err = reconcile_to_cents(&mut results, amount, DeductionSplit::default()).unwrap_err();
        assert_eq!(err, PolicyPeriodError::AmountOutOfRange(amount));
        assert_eq!(results, before);
    }

    #[test]
    fn test_calculate_reconciles_on_request() {
        let mut form = input(Some(date(2023, 11, 15)), Some(date(2024, 11, 15)), "12.345,67");
        form.is_passenger_car = true;

        let raw = calculate(&form, DeductionSplit::default(), false).unwrap();
        assert!(raw.iter().any(|r| dec(r.amount).scale() > 2));

        let reconciled = calculate(&form, DeductionSplit::default(), true).unwrap();
        let total: Decimal = reconciled.iter().map(|r| dec(r.amount)).sum();
        assert_eq!(total, Decimal::new(1_234_567, 2));

        form.total_amount = format!("1{}", "0".repeat(30));
        assert!(calculate(&form, DeductionSplit::default(), false).is_ok());
        assert!(matches!(
            calculate(&form, DeductionSplit::default(), true),
            Err(PolicyPeriodError::AmountOutOfRange(_))
        ));
    }
}
