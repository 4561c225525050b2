//! Resilient extraction and normalization of raw model output into a
//! canonical [`Agenda`].
//!
//! The model is untrusted: responses arrive fenced in markdown, wrapped in
//! quotes, surrounded by prose, with trailing commas, single-quoted, or in
//! an entirely different nested schema. [`normalize`] applies a fixed
//! sequence of recovery stages and either produces a validated agenda or a
//! typed failure. It is deliberately not a general JSON repairer: each
//! stage targets a malformed shape the upstream model is known to produce.

mod alternate;
mod extract;

use serde_json::Value;
use thiserror::Error;

use dawn_schema::{Agenda, SchemaError};

pub use extract::{
    extract_balanced_object, remove_trailing_commas, strip_code_fence, unwrap_outer_quotes,
};

#[derive(Debug, Error)]
/// Terminal normalization failures.
pub enum NormalizeError {
    /// No syntactically valid JSON object could be recovered.
    #[error("parse error: {0}")]
    Parse(String),
    /// Syntactically valid data that matches neither the canonical nor the
    /// alternate schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Normalizes raw model text into a canonical agenda for `target_date`.
///
/// Stages run in strict order: fence stripping, outer-quote unwrap,
/// balanced-object extraction, trailing-comma removal, strict parse (with
/// exactly one single-to-double quote repair), canonical validation, and
/// finally alternate-schema reshaping. Earlier stages recover and continue;
/// only the parse and the final validation fail terminally.
pub fn normalize(raw: &str, target_date: &str) -> Result<Agenda, NormalizeError> {
    let text = strip_code_fence(raw);
    let text = unwrap_outer_quotes(text);
    let candidate = extract_balanced_object(text);
    let candidate = remove_trailing_commas(&candidate);
    let value = parse_with_quote_repair(&candidate)?;

    let primary_failure = if value.get("date").is_some() && value.get("blocks").is_some() {
        match Agenda::from_value(&value, target_date) {
            Ok(agenda) => return Ok(agenda),
            Err(error) => {
                tracing::debug!(%error, "primary schema rejected, trying alternate shape");
                Some(error)
            }
        }
    } else {
        None
    };

    match alternate::reshape(&value, target_date) {
        Ok(reshaped) => Ok(Agenda::from_value(&reshaped, target_date)?),
        // When the payload claimed the primary shape, its validation error
        // is the more useful diagnostic.
        Err(alternate_failure) => Err(primary_failure.unwrap_or(alternate_failure).into()),
    }
}

/// Strict parse of the sanitized candidate, with exactly one repair attempt:
/// replace all single quotes with double quotes and reparse.
fn parse_with_quote_repair(candidate: &str) -> Result<Value, NormalizeError> {
    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            let repaired = candidate.replace('\'', "\"");
            serde_json::from_str(&repaired)
                .map_err(|_| NormalizeError::Parse(first_error.to_string()))
        }
    }
}
