use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyAreaId(pub i64);

/// A trainable region such as "Back" or "Cardio". Reference data shared by
/// exercises and focus areas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyArea {
    pub id: BodyAreaId,
    pub name: String,
}
