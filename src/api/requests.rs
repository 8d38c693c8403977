use crate::adjustment::QueueContext;
use crate::error::AppError;
use crate::state::{PredictionRequest, VisualEvidence};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PredictBody {
    pub hour: u8,
    pub day_of_week: u8,
    pub staff_count: u32,
    pub crowd_size: u32,
    #[serde(default)]
    pub context: Option<QueueContext>,
    #[serde(default)]
    pub image: Option<ImageBody>,
}

#[derive(Debug, Deserialize)]
pub struct ImageBody {
    pub mime_type: String,
    pub data_base64: String,
}

impl PredictBody {
    pub fn into_request(self) -> Result<PredictionRequest, AppError> {
        let mut request = PredictionRequest::new(
            self.hour,
            self.day_of_week,
            self.staff_count,
            self.crowd_size,
        )
        .with_context(self.context.unwrap_or_default());

        if let Some(image) = self.image {
            if !image.mime_type.starts_with("image/") {
                return Err(AppError::InvalidImage(format!(
                    "unsupported mime type: {}",
                    image.mime_type
                )));
            }
            let data = BASE64
                .decode(image.data_base64.trim())
                .map_err(|err| AppError::InvalidImage(err.to_string()))?;
            request = request.with_image(VisualEvidence {
                mime_type: image.mime_type,
                data,
            });
        }
        Ok(request)
    }
}

#[derive(Debug, Deserialize)]
pub struct CorrectionBody {
    pub predicted: f64,
    pub actual: f64,
    #[serde(default)]
    pub context: Option<QueueContext>,
}

impl CorrectionBody {
    pub fn context(&self) -> QueueContext {
        self.context.unwrap_or_default()
    }
}
