//! Prompt construction shared by every narrator backend.

use crate::narrative::NarrativeFacts;
use crate::state::{CorrectionRecord, PredictionRequest, VisualEvidence, WaitEstimate};
use std::fmt::Write;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt<'a> {
    pub text: String,
    pub image: Option<&'a VisualEvidence>,
}

pub fn build_prompt<'a>(facts: &NarrativeFacts<'a>) -> Prompt<'a> {
    match *facts {
        NarrativeFacts::Prediction { request, wait } => Prompt {
            text: prediction_text(request, wait),
            image: request.image.as_ref(),
        },
        NarrativeFacts::Correction { record } => Prompt {
            text: correction_text(record),
            image: None,
        },
    }
}

fn day_name(day_of_week: u8) -> &'static str {
    DAY_NAMES
        .get(usize::from(day_of_week))
        .copied()
        .unwrap_or("Unknown day")
}

fn prediction_text(request: &PredictionRequest, wait: WaitEstimate) -> String {
    let hour = request.hour;
    let mut text = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        text,
        "Act as an operations reasoning engine assisting store managers with queue planning."
    );
    let _ = writeln!(text);
    let _ = writeln!(text, "Situation:");
    let _ = writeln!(
        text,
        "- Time of analysis: {hour:02}:00 (24h), {}",
        day_name(request.day_of_week)
    );
    let _ = writeln!(text, "- Staff active: {}", request.staff_count);
    let _ = writeln!(text, "- People in queue: {}", request.crowd_size);
    let _ = writeln!(text, "- Predicted wait: {wait} minutes");
    let _ = writeln!(text, "- Environmental context: {}", request.context);
    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "The predicted wait of {wait} minutes is final. Explain it; do not re-estimate it."
    );
    let _ = writeln!(text);

    if request.image.is_some() {
        let _ = writeln!(text, "[VISUAL EVIDENCE PROVIDED]");
        let _ = writeln!(
            text,
            "A camera snapshot taken at {hour:02}:00 is attached."
        );
        let _ = writeln!(text, "1. Assess crowd density and mood in the image.");
        let _ = writeln!(
            text,
            "2. Check whether the visible crowd matches the reported {} people.",
            request.crowd_size
        );
        let _ = writeln!(
            text,
            "3. Treat the image as ground truth for that moment."
        );
    } else {
        let _ = writeln!(
            text,
            "No visual input provided. Base the analysis on the data above only."
        );
    }

    let _ = writeln!(text);
    let _ = writeln!(text, "Output format:");
    let _ = writeln!(text, "### Visual & Temporal Analysis");
    let _ = writeln!(
        text,
        "Confirm whether the scene is consistent with the reported context at {hour:02}:00."
    );
    let _ = writeln!(text, "### Root Cause Diagnosis");
    let _ = writeln!(
        text,
        "Explain the causal link between \"{}\" and the {wait} minute wait.",
        request.context
    );
    let _ = writeln!(text, "### Action Plan");
    let _ = writeln!(
        text,
        "- Immediate directive (P1): action to take at {hour:02}:05."
    );
    let _ = write!(
        text,
        "- Strategic adjustment (P2): staffing change for the next hour."
    );
    text
}

fn correction_text(record: &CorrectionRecord) -> String {
    let gap = record.gap_minutes();
    let direction = if gap > 0.0 {
        "longer than predicted"
    } else if gap < 0.0 {
        "shorter than predicted"
    } else {
        "exactly as predicted"
    };

    let mut text = String::new();
    let _ = writeln!(
        text,
        "Act as a queue forecasting analyst reviewing one prediction against reality."
    );
    let _ = writeln!(text);
    let _ = writeln!(text, "- Predicted wait: {} minutes", record.predicted);
    let _ = writeln!(text, "- Observed wait: {:.1} minutes", record.actual);
    let _ = writeln!(text, "- Gap: {gap:+.1} minutes ({direction})");
    let _ = writeln!(text, "- Environmental context: {}", record.context);
    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "1. Explain the most likely reasons for the {:.1} minute discrepancy.",
        gap.abs()
    );
    let _ = writeln!(
        text,
        "2. State how the estimate would be adjusted for similar conditions next time."
    );
    let _ = write!(
        text,
        "This is a review only: no model parameters are changed."
    );
    text
}
