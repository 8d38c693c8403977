//! Narrative port: renders free text from structured prediction or
//! correction facts.
//!
//! The engine treats every narrator as fallible. Callers never see a
//! `NarrativeError`; it is converted into fixed fallback text instead.

use crate::state::{CorrectionRecord, PredictionRequest, WaitEstimate};
use thiserror::Error;

pub mod gemini;
pub mod prompt;

pub use gemini::{GeminiNarrator, GeminiSettings};

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("no API credential configured")]
    MissingCredential,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http status {status} ({})", .body.trim())]
    Http { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response contained no text")]
    EmptyResponse,
}

/// The two shapes of fact a narrator is asked to explain.
#[derive(Debug, Clone, Copy)]
pub enum NarrativeFacts<'a> {
    Prediction {
        request: &'a PredictionRequest,
        wait: WaitEstimate,
    },
    Correction {
        record: &'a CorrectionRecord,
    },
}

pub trait Narrator: Send + Sync + std::fmt::Debug {
    fn render(&self, facts: &NarrativeFacts<'_>) -> Result<String, NarrativeError>;

    /// Short identifier used in logs and health output.
    fn name(&self) -> &str;

    /// Whether this narrator can produce text at all.
    fn is_available(&self) -> bool {
        true
    }
}

/// Used when no credential is configured. Every render fails, so callers
/// always receive fallback text.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineNarrator;

impl Narrator for OfflineNarrator {
    fn render(&self, _facts: &NarrativeFacts<'_>) -> Result<String, NarrativeError> {
        Err(NarrativeError::MissingCredential)
    }

    fn name(&self) -> &str {
        "offline"
    }

    fn is_available(&self) -> bool {
        false
    }
}

pub const CORRECTION_FALLBACK_MESSAGE: &str =
    "Correction analysis unavailable. The recorded estimate was not changed.";

pub fn prediction_fallback_message(err: &NarrativeError) -> String {
    format!("AI analysis failed: {err}. The numeric wait estimate remains valid.")
}
