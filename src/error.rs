use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("hour out of range (0-23): {0}")]
    InvalidHour(u8),
    #[error("day_of_week out of range (0-6): {0}")]
    InvalidDayOfWeek(u8),
    #[error("staff_count must be at least 1")]
    InvalidStaffCount,
    #[error("actual wait must be a finite, non-negative number of minutes: {0}")]
    InvalidActualMinutes(f64),
    #[error("predicted wait must be a finite, non-negative number of minutes: {0}")]
    InvalidPredictedMinutes(f64),
    #[error("invalid image: {0}")]
    InvalidImage(String),
}
