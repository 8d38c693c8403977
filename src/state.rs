use crate::adjustment::{QueueContext, round_tenths};
use crate::engine::QueueEngine;
use crate::error::AppError;
use crate::estimation::BaselineSource;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub const MAX_HOUR: u8 = 23;
pub const MAX_DAY_OF_WEEK: u8 = 6;

/// An image attached as evidence of the current queue, passed through to the
/// narrator untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct VisualEvidence {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for VisualEvidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualEvidence")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub hour: u8,
    /// 0 = Monday, 6 = Sunday.
    pub day_of_week: u8,
    pub staff_count: u32,
    pub crowd_size: u32,
    pub context: QueueContext,
    pub image: Option<VisualEvidence>,
}

impl PredictionRequest {
    pub fn new(hour: u8, day_of_week: u8, staff_count: u32, crowd_size: u32) -> Self {
        Self {
            hour,
            day_of_week,
            staff_count,
            crowd_size,
            context: QueueContext::default(),
            image: None,
        }
    }

    pub fn with_context(mut self, context: QueueContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_image(mut self, image: VisualEvidence) -> Self {
        self.image = Some(image);
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.hour > MAX_HOUR {
            return Err(AppError::InvalidHour(self.hour));
        }
        if self.day_of_week > MAX_DAY_OF_WEEK {
            return Err(AppError::InvalidDayOfWeek(self.day_of_week));
        }
        if self.staff_count == 0 {
            return Err(AppError::InvalidStaffCount);
        }
        if let Some(image) = &self.image
            && image.data.is_empty()
        {
            return Err(AppError::InvalidImage("image data is empty".to_string()));
        }
        Ok(())
    }
}

/// Final wait in minutes: non-negative, rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct WaitEstimate(f64);

impl WaitEstimate {
    pub fn from_minutes(minutes: f64) -> Self {
        let minutes = if minutes.is_finite() { minutes.max(0.0) } else { 0.0 };
        Self(round_tenths(minutes))
    }

    pub fn minutes(self) -> f64 {
        self.0
    }
}

impl fmt::Display for WaitEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningStatus {
    Generated,
    Fallback,
}

/// Explanation text. Never empty: a failed narrator yields a fallback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningText {
    text: String,
    status: ReasoningStatus,
}

impl ReasoningText {
    pub fn generated(text: String) -> Self {
        Self {
            text,
            status: ReasoningStatus::Generated,
        }
    }

    pub fn fallback(text: String) -> Self {
        Self {
            text,
            status: ReasoningStatus::Fallback,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> ReasoningStatus {
        self.status
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, ReasoningStatus::Fallback)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub wait: WaitEstimate,
    pub reasoning: ReasoningText,
    pub baseline_source: BaselineSource,
}

/// Predicted vs. observed wait for one request. Lives only for the duration of
/// a correction call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionRecord {
    pub predicted: WaitEstimate,
    pub actual: f64,
    pub context: QueueContext,
}

impl CorrectionRecord {
    /// Signed gap `actual - predicted`, rounded to one decimal place.
    pub fn gap_minutes(&self) -> f64 {
        round_tenths(self.actual - self.predicted.minutes())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub gap_minutes: f64,
    pub narrative: ReasoningText,
}

#[derive(Debug)]
pub struct AppState {
    engine: Arc<QueueEngine>,
}

impl AppState {
    pub fn new(engine: QueueEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &Arc<QueueEngine> {
        &self.engine
    }
}
