use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::body_area::{BodyArea, BodyAreaId};
use crate::domain::user::UserId;
use crate::errors::DomainError;

/// Number of distinct presentation colors a client cycles through.
pub const COLOR_PALETTE_SIZE: u32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FocusAreaId(pub i64);

/// Unit a focus area target is measured in. Presentation only; the scoring
/// math treats both the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PtsType {
    Effort,
    ActiveMinutes,
}

impl PtsType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Effort => "effort",
            Self::ActiveMinutes => "active_minutes",
        }
    }
}

impl std::str::FromStr for PtsType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "effort" => Ok(Self::Effort),
            "active_minutes" => Ok(Self::ActiveMinutes),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported pts type `{other}` (expected effort|active_minutes)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: PlanId,
    pub name: String,
    pub user_id: UserId,
}

/// Stored focus area row joined with its body area name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusArea {
    pub id: FocusAreaId,
    pub plan_id: PlanId,
    pub body_area_id: BodyAreaId,
    pub body_area_name: String,
    pub pts_per_period: u32,
    pub pts_type: PtsType,
    pub period_length_days: u32,
    pub color_index: Option<u32>,
}

impl FocusArea {
    pub fn body_area(&self) -> BodyArea {
        BodyArea { id: self.body_area_id, name: self.body_area_name.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWithFocusAreas {
    #[serde(flatten)]
    pub plan: WorkoutPlan,
    #[serde(rename = "focusAreas")]
    pub focus_areas: Vec<FocusArea>,
}

/// Focus area as submitted by a client, before validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusAreaDraft {
    pub body_area_id: BodyAreaId,
    pub pts_per_period: i64,
    pub pts_type: PtsType,
    pub period_length_days: i64,
    #[serde(default)]
    pub color_index: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub focus_areas: Vec<FocusAreaDraft>,
}

/// A focus area that passed validation and is ready to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFocusArea {
    pub body_area_id: BodyAreaId,
    pub pts_per_period: u32,
    pub pts_type: PtsType,
    pub period_length_days: u32,
    pub color_index: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPlan {
    pub name: String,
    pub focus_areas: Vec<NewFocusArea>,
}

impl PlanDraft {
    /// Validates a plan submission. Creation requires at least one focus
    /// area; a full replace may clear them.
    pub fn validate(self, require_focus_areas: bool) -> Result<NewPlan, DomainError> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(DomainError::MissingField { field: "Plan name" }),
        };

        if require_focus_areas && self.focus_areas.is_empty() {
            return Err(DomainError::InvariantViolation(
                "At least one focus area is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut focus_areas = Vec::with_capacity(self.focus_areas.len());
        for draft in self.focus_areas {
            if !seen.insert(draft.body_area_id) {
                return Err(DomainError::InvariantViolation(format!(
                    "body area {} appears more than once in the plan",
                    draft.body_area_id.0
                )));
            }
            focus_areas.push(draft.validate()?);
        }

        Ok(NewPlan { name, focus_areas })
    }
}

impl FocusAreaDraft {
    fn validate(self) -> Result<NewFocusArea, DomainError> {
        let pts_per_period = positive("ptsPerPeriod", self.pts_per_period)?;
        let period_length_days = positive("periodLengthDays", self.period_length_days)?;

        if let Some(index) = self.color_index {
            if index >= COLOR_PALETTE_SIZE {
                return Err(DomainError::OutOfRange {
                    field: "colorIndex",
                    requirement: "between 0 and 11",
                });
            }
        }

        Ok(NewFocusArea {
            body_area_id: self.body_area_id,
            pts_per_period,
            pts_type: self.pts_type,
            period_length_days,
            color_index: self.color_index,
        })
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32, DomainError> {
    u32::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .ok_or(DomainError::OutOfRange { field, requirement: "a positive integer" })
}

/// Lowest palette slot not already taken, wrapping when every slot is used.
pub fn next_color_index(used: &[u32], position: usize) -> u32 {
    (0..COLOR_PALETTE_SIZE)
        .find(|slot| !used.contains(slot))
        .unwrap_or((position as u32) % COLOR_PALETTE_SIZE)
}
