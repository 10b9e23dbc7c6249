use serde::{Deserialize, Serialize};

use crate::domain::plan::PlanId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub active_plan_id: Option<PlanId>,
}

/// Trims the requested display name and rejects blank input.
pub fn normalize_user_name(raw: Option<&str>) -> Result<String, DomainError> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(DomainError::MissingField { field: "Name" }),
    }
}
