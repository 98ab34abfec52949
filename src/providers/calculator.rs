//! Inline arithmetic results
//!
//! A recognized expression bypasses fuzzy matching and the usage blend and
//! always ranks at the top with score 1.0.

use tracing::debug;

use super::{QueryContext, ResultProvider};
use crate::calculator::{evaluate, format_number, looks_like_expression};
use crate::candidate::{Candidate, CandidateAction, CandidateKind, Query, ScoredCandidate};
use crate::error::LauncherError;

pub const CALCULATOR_ID: &str = "calculator-result";

const CALCULATION_SCORE: f64 = 1.0;

#[derive(Debug, Default)]
pub struct CalculatorProvider;

impl CalculatorProvider {
    pub fn new() -> Self {
        CalculatorProvider
    }
}

impl ResultProvider for CalculatorProvider {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn provide(&self, query: &Query, _context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>> {
        let expression = query.raw().trim();
        if !looks_like_expression(expression) {
            return Ok(Vec::new());
        }

        let candidate = match evaluate(expression) {
            Ok(value) => {
                let text = format_number(value);
                Candidate::new(
                    CALCULATOR_ID,
                    text.clone(),
                    format!("{} =", expression),
                    CandidateKind::Calculation,
                    CandidateAction::CopyText { text },
                )
            }
            Err(e) => {
                let error = LauncherError::from(e);
                debug!(expression, error = %error, severity = ?error.severity(), "Expression did not evaluate");
                let message = error.user_message();
                Candidate::new(
                    CALCULATOR_ID,
                    "Invalid expression",
                    message.clone(),
                    CandidateKind::Calculation,
                    CandidateAction::Unavailable { reason: message },
                )
            }
        };

        Ok(vec![ScoredCandidate::new(
            candidate.with_match_score(CALCULATION_SCORE),
            CALCULATION_SCORE,
        )])
    }
}
