//! Special consumption tax (ÖTV) and VAT (KDV) splitter
//!
//! Works backwards from a tax-inclusive total. ÖTV is charged on the base
//! price and KDV on base + ÖTV, so the total is `base * (1 + sct) * (1 + vat)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::numeric::{self, AmountError, INVALID_AMOUNT_MESSAGE};

/// Default ÖTV rate (10%)
pub const DEFAULT_SCT_RATE: f64 = 0.10;

/// Default KDV rate (10%)
pub const DEFAULT_VAT_RATE: f64 = 0.10;

fn default_sct_rate() -> f64 {
    DEFAULT_SCT_RATE
}

fn default_vat_rate() -> f64 {
    DEFAULT_VAT_RATE
}

/// Rates applied by the splitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    /// Special consumption tax, applied to the base price
    #[serde(default = "default_sct_rate")]
    pub sct_rate: f64,

    /// Value added tax, applied to base price + ÖTV
    #[serde(default = "default_vat_rate")]
    pub vat_rate: f64,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            sct_rate: DEFAULT_SCT_RATE,
            vat_rate: DEFAULT_VAT_RATE,
        }
    }
}

/// Components recovered from a tax-inclusive total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxSplitResult {
    pub base_price: f64,
    pub sct: f64,
    pub vat: f64,
    /// base_price + sct + vat, reconstructs the input total
    pub verification_total: f64,
}

/// The tax form's amount could not be split
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaxInputError {
    #[error("{}", INVALID_AMOUNT_MESSAGE)]
    InvalidAmount(#[from] AmountError),
}

/// Split a tax-inclusive total into base price, ÖTV and KDV
pub fn split_tax(total: f64, rates: &TaxRates) -> TaxSplitResult {
    let base_price = total / ((1.0 + rates.sct_rate) * (1.0 + rates.vat_rate));
    let sct = base_price * rates.sct_rate;
    let vat = (base_price + sct) * rates.vat_rate;
    let verification_total = base_price + sct + vat;

    TaxSplitResult {
        base_price,
        sct,
        vat,
        verification_total,
    }
}

/// Parse a locale-formatted total and split it.
///
/// Anything other than digits and separators is dropped first, as the
/// amount field does while typing.
///
/// Unparseable and non-positive totals are rejected with the same
/// "invalid amount" error the policy calculator reports.
pub fn split_tax_input(input: &str, rates: &TaxRates) -> Result<TaxSplitResult, TaxInputError> {
    let total = numeric::parse_amount_field(input).map_err(|e| {
        log::debug!("rejected tax input {:?}: {}", input, e);
        e
    })?;

    let result = split_tax(total, rates);
    log::debug!(
        "split {:.2} into base {:.2}, sct {:.2}, vat {:.2}",
        total,
        result.base_price,
        result.sct,
        result.vat
    );
    Ok(result)
}
