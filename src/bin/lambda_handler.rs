//! AWS Lambda handler for the calculators
//!
//! Accepts a JSON body naming the tool to run and returns its result as JSON.
//! Validation failures come back as 422 with the user-facing message.
//!
//! Supports Lambda Function URLs for direct HTTP access.

use calc_tools::policy::{self, PolicyPeriodInput, PolicyPeriodResult, PolicyPeriodSummary};
use calc_tools::summarizer::{self, Summarizer};
use calc_tools::{tax, AppConfig, GeminiClient, TaxRates, TaxSplitResult};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};

/// Input for one tool invocation
#[derive(Debug, Deserialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum ToolRequest {
    Tax {
        /// Locale-formatted total, e.g. "1.234,56"
        amount: String,
    },
    Policy {
        #[serde(flatten)]
        input: PolicyPeriodInput,

        /// Round to whole cents that add up to the total
        #[serde(default)]
        reconcile_cents: bool,
    },
    Summarize {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum ToolResponse {
    Tax {
        rates: TaxRates,
        result: TaxSplitResult,
    },
    Policy {
        results: Vec<PolicyPeriodResult>,
        summary: PolicyPeriodSummary,
    },
    Summarize {
        summary: String,
    },
}

/// Handler outcome before it is turned into an HTTP response
#[derive(Debug)]
enum Outcome {
    Ok(ToolResponse),
    Failed { status: u16, message: String },
}

impl Outcome {
    fn failed(status: u16, message: impl Into<String>) -> Self {
        Outcome::Failed {
            status,
            message: message.into(),
        }
    }
}

fn body_text(body: &Body) -> String {
    match body {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => "{}".to_string(),
    }
}

async fn dispatch<S>(body: &str, config: &AppConfig, summarizer: &S) -> Outcome
where
    S: Summarizer + ?Sized,
{
    let request: ToolRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return Outcome::failed(400, format!("Invalid JSON: {}", e)),
    };

    match request {
        ToolRequest::Tax { amount } => match tax::split_tax_input(&amount, &config.tax) {
            Ok(result) => Outcome::Ok(ToolResponse::Tax {
                rates: config.tax,
                result,
            }),
            Err(e) => Outcome::failed(422, e.to_string()),
        },
        ToolRequest::Policy {
            input,
            reconcile_cents,
        } => {
            let results =
                match policy::calculate(&input, config.deduction_split(), reconcile_cents) {
                    Ok(results) => results,
                    Err(e) => return Outcome::failed(422, e.to_string()),
                };
            let summary = PolicyPeriodSummary::from_results(&results);
            Outcome::Ok(ToolResponse::Policy { results, summary })
        }
        ToolRequest::Summarize { text } => {
            match summarizer::summarize_text(summarizer, &text).await {
                Ok(summary) => Outcome::Ok(ToolResponse::Summarize { summary }),
                Err(e) if e.is_preflight() => Outcome::failed(422, e.user_message()),
                Err(e) => Outcome::failed(502, e.user_message()),
            }
        }
    }
}

fn error_response(status: u16, message: &str) -> Result<Response<Body>, Error> {
    let body = serde_json::json!({ "error": message });
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(body.to_string()))?)
}

fn json_response(body: &ToolResponse) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(serde_json::to_string(body)?))?)
}

/// Lambda handler function
async fn handler<S>(event: Request, config: &AppConfig, summarizer: &S) -> Result<Response<Body>, Error>
where
    S: Summarizer + ?Sized,
{
    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(200)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)?);
    }

    let start = std::time::Instant::now();
    let outcome = dispatch(&body_text(event.body()), config, summarizer).await;
    log::info!("request handled in {} ms", start.elapsed().as_millis());

    match outcome {
        Outcome::Ok(response) => json_response(&response),
        Outcome::Failed { status, message } => {
            log::warn!("request failed with {}: {}", status, message);
            error_response(status, &message)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let config = AppConfig::load(None)?;
    let client = GeminiClient::new(config.summarizer.clone())?;

    run(service_fn(|event| handler(event, &config, &client))).await
}
