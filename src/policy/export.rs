//! CSV export of a quarter breakdown

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::PolicyPeriodResult;

/// One CSV line; split columns stay empty when no split was applied
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    quarter: String,
    days: u32,
    amount: String,
    deductible: Option<String>,
    non_deductible: Option<String>,
}

impl From<&PolicyPeriodResult> for CsvRow {
    fn from(result: &PolicyPeriodResult) -> Self {
        Self {
            quarter: result.quarter.label(),
            days: result.days,
            amount: format!("{:.2}", result.amount),
            deductible: result.deductible.map(|v| format!("{:.2}", v)),
            non_deductible: result.non_deductible.map(|v| format!("{:.2}", v)),
        }
    }
}

/// Write the breakdown to any writer
pub fn write_csv<W: Write>(results: &[PolicyPeriodResult], writer: W) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(CsvRow::from(result))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the breakdown to a file
pub fn write_csv_file<P: AsRef<Path>>(results: &[PolicyPeriodResult], path: P) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    write_csv(results, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{prorate, DeductionSplit};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_write_csv_without_split() {
        let results = prorate(date(2024, 3, 30), date(2024, 4, 2), 300.0, None);
        let mut buf = Vec::new();
        write_csv(&results, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "quarter,days,amount,deductible,non_deductible\n\
             2024 Q1,2,200.00,,\n\
             2024 Q2,1,100.00,,\n"
        );
    }

    #[test]
    fn test_write_csv_with_split() {
        let results = prorate(
            date(2024, 1, 10),
            date(2024, 1, 20),
            900.0,
            Some(DeductionSplit::default()),
        );
        let mut buf = Vec::new();
        write_csv(&results, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2024 Q1,10,900.00,630.00,270.00");
    }
}
