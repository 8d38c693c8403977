//! Prediction pipeline: baseline estimate, context adjustment, narrative.
//!
//! The engine holds no mutable state. The regression artifact it wraps is
//! read-only, so a single instance is shared by every request.

use crate::adjustment::{QueueContext, adjust};
use crate::error::AppError;
use crate::estimation::model::FeatureVector;
use crate::estimation::{BaselineEstimator, BaselineSource};
use crate::narrative::{
    CORRECTION_FALLBACK_MESSAGE, NarrativeError, NarrativeFacts, Narrator,
    prediction_fallback_message,
};
use crate::state::{
    Correction, CorrectionRecord, Prediction, PredictionRequest, ReasoningText, WaitEstimate,
};
use tracing::{info, warn};

#[derive(Debug)]
pub struct QueueEngine {
    baseline: BaselineEstimator,
    narrator: Box<dyn Narrator>,
}

impl QueueEngine {
    pub fn new(baseline: BaselineEstimator, narrator: Box<dyn Narrator>) -> Self {
        Self { baseline, narrator }
    }

    pub fn baseline(&self) -> &BaselineEstimator {
        &self.baseline
    }

    pub fn narrator(&self) -> &dyn Narrator {
        self.narrator.as_ref()
    }

    /// Final wait estimate only, without contacting the narrator.
    pub fn estimate(
        &self,
        request: &PredictionRequest,
    ) -> Result<(WaitEstimate, BaselineSource), AppError> {
        request.validate()?;
        let features = FeatureVector::new(
            request.hour,
            request.day_of_week,
            request.staff_count,
            request.crowd_size,
        );
        let baseline = self.baseline.estimate(&features);
        let adjusted = adjust(baseline.minutes, request.context, request.crowd_size);
        Ok((WaitEstimate::from_minutes(adjusted), baseline.source))
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction, AppError> {
        let (wait, baseline_source) = self.estimate(request)?;
        info!(
            wait_minutes = wait.minutes(),
            context = request.context.as_str(),
            source = ?baseline_source,
            "Wait time estimated"
        );

        let facts = NarrativeFacts::Prediction { request, wait };
        let reasoning = match self.narrator.render(&facts) {
            Ok(text) if !text.trim().is_empty() => ReasoningText::generated(text),
            Ok(_) => {
                warn!(narrator = self.narrator.name(), "Narrator returned empty text");
                ReasoningText::fallback(prediction_fallback_message(
                    &NarrativeError::EmptyResponse,
                ))
            }
            Err(err) => {
                warn!(narrator = self.narrator.name(), error = %err, "Narrative generation failed");
                ReasoningText::fallback(prediction_fallback_message(&err))
            }
        };

        Ok(Prediction {
            wait,
            reasoning,
            baseline_source,
        })
    }

    /// Describe the gap between a prediction and the observed wait. Nothing
    /// about the estimator changes as a result.
    pub fn generate_correction(
        &self,
        predicted: f64,
        actual: f64,
        context: QueueContext,
    ) -> Result<Correction, AppError> {
        if !predicted.is_finite() || predicted < 0.0 {
            return Err(AppError::InvalidPredictedMinutes(predicted));
        }
        if !actual.is_finite() || actual < 0.0 {
            return Err(AppError::InvalidActualMinutes(actual));
        }

        let record = CorrectionRecord {
            predicted: WaitEstimate::from_minutes(predicted),
            actual,
            context,
        };
        let gap_minutes = record.gap_minutes();
        info!(
            predicted = record.predicted.minutes(),
            actual,
            gap_minutes,
            context = context.as_str(),
            "Correction requested"
        );

        let facts = NarrativeFacts::Correction { record: &record };
        let narrative = match self.narrator.render(&facts) {
            Ok(text) if !text.trim().is_empty() => ReasoningText::generated(text),
            Ok(_) => ReasoningText::fallback(CORRECTION_FALLBACK_MESSAGE.to_string()),
            Err(err) => {
                warn!(narrator = self.narrator.name(), error = %err, "Correction narrative failed");
                ReasoningText::fallback(CORRECTION_FALLBACK_MESSAGE.to_string())
            }
        };

        Ok(Correction {
            gap_minutes,
            narrative,
        })
    }
}
