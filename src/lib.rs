//! Calc Tools - small financial calculators with an AI text summarizer
//!
//! This library provides:
//! - ÖTV & KDV splitting of a tax-inclusive total
//! - Policy period proration over calendar quarters, with the passenger car
//!   deductible / non-deductible (KKEG) split
//! - Text summarization through an external generative-language service
//! - Menu-driven session state and a line-oriented terminal front end

pub mod app;
pub mod config;
pub mod numeric;
pub mod policy;
pub mod render;
pub mod summarizer;
pub mod tax;

// Re-export commonly used types
pub use app::{AppState, Screen};
pub use config::AppConfig;
pub use policy::{DeductionSplit, PolicyPeriodInput, PolicyPeriodResult, Quarter};
pub use summarizer::{GeminiClient, SummarizeError, Summarizer};
pub use tax::{split_tax, TaxRates, TaxSplitResult};
