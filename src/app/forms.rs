//! Form state for each calculator screen
//!
//! Every submission starts by clearing the previous result and error, so a
//! stale result is never shown next to new input.

use chrono::NaiveDate;

use crate::numeric::sanitize_amount_input;
use crate::policy::{
    self, DeductionSplit, PolicyPeriodInput, PolicyPeriodResult, PolicyPeriodSummary,
};
use crate::summarizer::{self, Summarizer};
use crate::tax::{self, TaxRates, TaxSplitResult};

/// ÖTV & KDV splitter form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxForm {
    pub amount: String,
    pub result: Option<TaxSplitResult>,
    pub error: Option<String>,
}

impl TaxForm {
    /// Store typed input, keeping only digits and separators
    pub fn set_amount(&mut self, raw: &str) {
        self.amount = sanitize_amount_input(raw);
    }

    pub fn can_submit(&self) -> bool {
        !self.amount.is_empty()
    }

    pub fn submit(&mut self, rates: &TaxRates) {
        self.result = None;
        self.error = None;

        match tax::split_tax_input(&self.amount, rates) {
            Ok(result) => self.result = Some(result),
            Err(e) => self.error = Some(e.to_string()),
        }
    }
}

/// Policy period proration form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyForm {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub amount: String,
    pub is_passenger_car: bool,
    /// Round the breakdown to cents that add up to the total
    pub reconcile_cents: bool,
    pub results: Option<Vec<PolicyPeriodResult>>,
    pub error: Option<String>,
}

impl PolicyForm {
    pub fn set_amount(&mut self, raw: &str) {
        self.amount = sanitize_amount_input(raw);
    }

    pub fn can_submit(&self) -> bool {
        self.start.is_some() && self.end.is_some() && !self.amount.is_empty()
    }

    pub fn input(&self) -> PolicyPeriodInput {
        PolicyPeriodInput {
            start: self.start,
            end: self.end,
            total_amount: self.amount.clone(),
            is_passenger_car: self.is_passenger_car,
        }
    }

    pub fn submit(&mut self, split: DeductionSplit) {
        self.results = None;
        self.error = None;

        match policy::calculate(&self.input(), split, self.reconcile_cents) {
            Ok(results) => self.results = Some(results),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Totals row for the current results
    pub fn summary(&self) -> Option<PolicyPeriodSummary> {
        self.results
            .as_deref()
            .map(PolicyPeriodSummary::from_results)
    }
}

/// Text summarizer form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummarizerForm {
    pub input: String,
    pub result: Option<String>,
    pub error: Option<String>,
    /// Set for exactly as long as a request is outstanding
    pub is_loading: bool,
}

impl SummarizerForm {
    pub fn can_submit(&self) -> bool {
        !self.input.is_empty() && !self.is_loading
    }

    /// Submit the current text.
    ///
    /// Pre-flight failures are reported without touching the previous
    /// result; a request clears both result and error before it starts.
    pub async fn submit<S>(&mut self, summarizer: &S)
    where
        S: Summarizer + ?Sized,
    {
        if self.is_loading {
            log::debug!("summary already in flight, ignoring submit");
            return;
        }

        if let Err(e) = summarizer::preflight(summarizer, &self.input) {
            self.error = Some(e.user_message());
            return;
        }

        self.is_loading = true;
        self.error = None;
        self.result = None;

        match summarizer::summarize_text(summarizer, &self.input).await {
            Ok(summary) => self.result = Some(summary),
            Err(e) => self.error = Some(e.user_message()),
        }

        self.is_loading = false;
    }
}
