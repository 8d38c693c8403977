//! Context adjustment rules applied to the baseline estimate.
//!
//! Exactly one rule is selected per request from `CONTEXT_RULES`. The rule's
//! factor is applied before its offset. A low-crowd sanity clamp follows,
//! unless the rule is exempt from it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// Crowds below this size are subject to the sanity clamp.
pub const LOW_CROWD_THRESHOLD: u32 = 5;
/// Upper bound per person applied by the sanity clamp.
pub const LOW_CROWD_MINUTES_PER_HEAD: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueContext {
    #[default]
    NormalDay,
    HolidayRush,
    StaffShortage,
    TechnicalIssue,
    RainyWeather,
    /// Any label this build does not know about. Adjusts nothing.
    Unrecognized,
}

impl QueueContext {
    pub fn as_str(self) -> &'static str {
        match self {
            QueueContext::NormalDay => "normal_day",
            QueueContext::HolidayRush => "holiday_rush",
            QueueContext::StaffShortage => "staff_shortage",
            QueueContext::TechnicalIssue => "technical_issue",
            QueueContext::RainyWeather => "rainy_weather",
            QueueContext::Unrecognized => "unrecognized",
        }
    }

    /// Human-readable label, as shown to store staff.
    pub fn label(self) -> &'static str {
        match self {
            QueueContext::NormalDay => "Normal Day",
            QueueContext::HolidayRush => "Holiday Rush",
            QueueContext::StaffShortage => "Staff Shortage",
            QueueContext::TechnicalIssue => "Technical Issue",
            QueueContext::RainyWeather => "Rainy Weather",
            QueueContext::Unrecognized => "Unspecified",
        }
    }

    /// Accepts `NormalDay`, `normal_day`, `normal-day` and `Normal Day` alike.
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "normalday" => QueueContext::NormalDay,
            "holidayrush" => QueueContext::HolidayRush,
            "staffshortage" => QueueContext::StaffShortage,
            "technicalissue" => QueueContext::TechnicalIssue,
            "rainyweather" => QueueContext::RainyWeather,
            _ => {
                debug!(context = raw, "Unrecognized context, no adjustment applied");
                QueueContext::Unrecognized
            }
        }
    }

    pub fn rule(self) -> ContextRule {
        CONTEXT_RULES
            .iter()
            .find(|(context, _)| *context == self)
            .map(|(_, rule)| *rule)
            .unwrap_or(ContextRule::IDENTITY)
    }
}

impl fmt::Display for QueueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for QueueContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QueueContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(QueueContext::parse(&raw))
    }
}

/// `adjusted = baseline * factor + offset`, optionally exempt from the clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextRule {
    pub factor: f64,
    pub offset: f64,
    pub clamp_exempt: bool,
}

impl ContextRule {
    pub const IDENTITY: ContextRule = ContextRule::scale(1.0);

    const fn scale(factor: f64) -> Self {
        Self {
            factor,
            offset: 0.0,
            clamp_exempt: false,
        }
    }

    pub fn apply(&self, baseline: f64) -> f64 {
        baseline * self.factor + self.offset
    }
}

pub const CONTEXT_RULES: [(QueueContext, ContextRule); 5] = [
    (QueueContext::NormalDay, ContextRule::scale(0.8)),
    (QueueContext::HolidayRush, ContextRule::scale(1.5)),
    (QueueContext::StaffShortage, ContextRule::scale(1.3)),
    (QueueContext::RainyWeather, ContextRule::scale(1.1)),
    // A failure doubles the existing load and adds a fixed repair delay.
    // Few people can still wait long, so the clamp is suspended.
    (
        QueueContext::TechnicalIssue,
        ContextRule {
            factor: 2.0,
            offset: 10.0,
            clamp_exempt: true,
        },
    ),
];

/// Context transform plus the low-crowd clamp, before rounding.
pub fn adjust(baseline: f64, context: QueueContext, crowd_size: u32) -> f64 {
    let rule = context.rule();
    let adjusted = rule.apply(baseline);

    if !rule.clamp_exempt && crowd_size < LOW_CROWD_THRESHOLD {
        let ceiling = f64::from(crowd_size) * LOW_CROWD_MINUTES_PER_HEAD;
        return adjusted.min(ceiling);
    }
    adjusted
}

/// Round to one decimal place, half away from zero.
pub fn round_tenths(minutes: f64) -> f64 {
    (minutes * 10.0).round() / 10.0
}
