//! Plain-text result tables

use std::fmt::Write;

use crate::numeric::format_currency;
use crate::policy::{PolicyPeriodResult, PolicyPeriodSummary};
use crate::tax::{TaxRates, TaxSplitResult};

const LABEL_WIDTH: usize = 20;
const AMOUNT_WIDTH: usize = 18;

fn percent(rate: f64) -> String {
    format!("%{:.0}", rate * 100.0)
}

fn push_row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{:<LABEL_WIDTH$} {:>AMOUNT_WIDTH$}", label, value);
}

fn rule(width: usize) -> String {
    "-".repeat(width)
}

/// Tax splitter result: base price, ÖTV, KDV and the verification total
pub fn render_tax(result: &TaxSplitResult, rates: &TaxRates) -> String {
    let mut out = String::new();
    push_row(&mut out, "Mal Bedeli", &format_currency(result.base_price));
    push_row(
        &mut out,
        &format!("ÖTV Tutarı ({})", percent(rates.sct_rate)),
        &format_currency(result.sct),
    );
    push_row(
        &mut out,
        &format!("KDV Tutarı ({})", percent(rates.vat_rate)),
        &format_currency(result.vat),
    );
    out.push_str(&rule(LABEL_WIDTH + AMOUNT_WIDTH + 1));
    out.push('\n');
    push_row(&mut out, "Kontrol Toplamı", &format_currency(result.verification_total));
    out
}

/// Quarter breakdown with a totals row.
///
/// With a deductible split the table shows the deductible and KKEG columns
/// and adds a verification total; otherwise it shows the prorated amount.
pub fn render_policy_periods(results: &[PolicyPeriodResult], deductible_share: f64) -> String {
    let summary = PolicyPeriodSummary::from_results(results);
    let mut out = String::new();

    match (summary.total_deductible, summary.total_non_deductible) {
        (Some(total_deductible), Some(total_non_deductible)) => {
            let width = 10 + 1 + 6 + 2 * (1 + AMOUNT_WIDTH);
            let _ = writeln!(
                out,
                "{:<10} {:>6} {:>AMOUNT_WIDTH$} {:>AMOUNT_WIDTH$}",
                "Dönem",
                "Gün",
                format!("Gider ({})", percent(deductible_share)),
                format!("KKEG ({})", percent(1.0 - deductible_share)),
            );
            out.push_str(&rule(width));
            out.push('\n');
            for r in results {
                let _ = writeln!(
                    out,
                    "{:<10} {:>6} {:>AMOUNT_WIDTH$} {:>AMOUNT_WIDTH$}",
                    r.quarter.label(),
                    r.days,
                    format_currency(r.deductible.unwrap_or_default()),
                    format_currency(r.non_deductible.unwrap_or_default()),
                );
            }
            out.push_str(&rule(width));
            out.push('\n');
            let _ = writeln!(
                out,
                "{:<10} {:>6} {:>AMOUNT_WIDTH$} {:>AMOUNT_WIDTH$}",
                "TOPLAM",
                summary.total_days,
                format_currency(total_deductible),
                format_currency(total_non_deductible),
            );
            push_row(&mut out, "Kontrol Toplamı", &format_currency(summary.total_amount));
        }
        _ => {
            let width = 10 + 1 + 10 + 1 + AMOUNT_WIDTH;
            let _ = writeln!(
                out,
                "{:<10} {:>10} {:>AMOUNT_WIDTH$}",
                "Dönem", "Gün Sayısı", "Tutar"
            );
            out.push_str(&rule(width));
            out.push('\n');
            for r in results {
                let _ = writeln!(
                    out,
                    "{:<10} {:>10} {:>AMOUNT_WIDTH$}",
                    r.quarter.label(),
                    r.days,
                    format_currency(r.amount),
                );
            }
            out.push_str(&rule(width));
            out.push('\n');
            let _ = writeln!(
                out,
                "{:<10} {:>10} {:>AMOUNT_WIDTH$}",
                "TOPLAM",
                summary.total_days,
                format_currency(summary.total_amount),
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{prorate, DeductionSplit};
    use crate::tax::split_tax;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_render_tax() {
        let rates = TaxRates::default();
        let text = render_tax(&split_tax(121.0, &rates), &rates);

        assert!(text.contains("Mal Bedeli"));
        assert!(text.contains("100,00₺"));
        assert!(text.contains("ÖTV Tutarı (%10)"));
        assert!(text.contains("11,00₺"));
        assert!(text.lines().last().unwrap().contains("121,00₺"));
    }

    #[test]
    fn test_render_policy_without_split() {
        let results = prorate(date(2024, 3, 30), date(2024, 4, 2), 300.0, None);
        let text = render_policy_periods(&results, 0.7);

        assert!(text.contains("Gün Sayısı"));
        assert!(text.contains("2024 Q1"));
        assert!(text.contains("200,00₺"));
        let total = text.lines().last().unwrap();
        assert!(total.starts_with("TOPLAM"));
        assert!(total.contains("300,00₺"));
        assert!(!text.contains("KKEG"));
    }

    #[test]
    fn test_render_policy_with_split() {
        let results = prorate(
            date(2024, 1, 10),
            date(2024, 1, 20),
            900.0,
            Some(DeductionSplit::default()),
        );
        let text = render_policy_periods(&results, 0.7);

        assert!(text.contains("Gider (%70)"));
        assert!(text.contains("KKEG (%30)"));
        assert!(text.contains("630,00₺"));
        assert!(text.contains("270,00₺"));
        assert!(text.lines().last().unwrap().contains("900,00₺"));
    }
}
