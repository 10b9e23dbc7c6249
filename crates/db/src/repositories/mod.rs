use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use trainwise_core::domain::body_area::BodyArea;
use trainwise_core::domain::exercise::{CatalogExercise, ExerciseId};
use trainwise_core::domain::plan::{NewPlan, PlanId, PlanWithFocusAreas};
use trainwise_core::domain::user::{User, UserId};
use trainwise_core::domain::workout::{
    ActiveWorkout, SetId, Workout, WorkoutId, WorkoutSet, WorkoutWithSets, WORKOUT_DATE_FORMAT,
};
use trainwise_core::suggestions::SuggestionInput;

use crate::DbPool;

pub mod catalog;
pub mod plan;
pub mod suggestion;
pub mod user;
pub mod workout;

pub use catalog::SqlCatalogRepository;
pub use plan::SqlPlanRepository;
pub use suggestion::SqlSuggestionStore;
pub use user::SqlUserRepository;
pub use workout::SqlWorkoutRepository;

/// Finished workouts returned by a history listing.
pub const HISTORY_LIMIT: i64 = 30;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unknown reference: {0}")]
    UnknownReference(String),
}

/// Result of pointing a user at a plan (or at none).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivePlanChange {
    Updated(User),
    UserNotFound,
    PlanNotFound,
}

/// Result of logging a set against a workout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetInsert {
    Added(WorkoutSet),
    WorkoutNotActive,
    UnknownExercise,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn create(&self, name: &str) -> Result<User, RepositoryError>;
    async fn set_active_plan(
        &self,
        id: UserId,
        plan_id: Option<PlanId>,
    ) -> Result<ActivePlanChange, RepositoryError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_body_areas(&self) -> Result<Vec<BodyArea>, RepositoryError>;
    async fn list_exercises(&self) -> Result<Vec<CatalogExercise>, RepositoryError>;
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn list_for_user(&self, user_id: UserId)
        -> Result<Vec<PlanWithFocusAreas>, RepositoryError>;
    async fn find_by_id(&self, id: PlanId) -> Result<Option<PlanWithFocusAreas>, RepositoryError>;
    async fn create(
        &self,
        user_id: UserId,
        plan: NewPlan,
    ) -> Result<PlanWithFocusAreas, RepositoryError>;
    /// Renames the plan and replaces all of its focus areas atomically.
    async fn replace(
        &self,
        id: PlanId,
        plan: NewPlan,
    ) -> Result<Option<PlanWithFocusAreas>, RepositoryError>;
    /// Deletes the plan, clearing any user's active selection of it first.
    async fn delete(&self, id: PlanId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    /// Starts a workout. Fails with [`RepositoryError::Conflict`] when the
    /// user already has an unfinished one; `None` when the user is unknown.
    async fn start(
        &self,
        user_id: UserId,
        workout_date: NaiveDate,
        started_at: DateTime<Utc>,
    ) -> Result<Option<Workout>, RepositoryError>;
    async fn finish(
        &self,
        id: WorkoutId,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<Workout>, RepositoryError>;
    /// Deletes an unfinished workout together with its sets.
    async fn abort(&self, id: WorkoutId) -> Result<bool, RepositoryError>;
    async fn active_for_user(&self, user_id: UserId)
        -> Result<Option<ActiveWorkout>, RepositoryError>;
    async fn update_date(
        &self,
        id: WorkoutId,
        workout_date: NaiveDate,
    ) -> Result<Option<Workout>, RepositoryError>;
    async fn delete_finished(&self, id: WorkoutId) -> Result<bool, RepositoryError>;
    async fn history(&self, user_id: UserId) -> Result<Vec<WorkoutWithSets>, RepositoryError>;

    async fn add_set(
        &self,
        workout_id: WorkoutId,
        exercise_id: ExerciseId,
        pts: u32,
    ) -> Result<SetInsert, RepositoryError>;
    async fn update_set_pts(&self, id: SetId, pts: u32)
        -> Result<Option<WorkoutSet>, RepositoryError>;
    async fn delete_set(&self, id: SetId) -> Result<bool, RepositoryError>;
}

/// Day a suggestion snapshot is evaluated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotDate {
    /// The current day. Windows stay open-ended, so a workout dated later
    /// still counts.
    Today(NaiveDate),
    /// A chosen day. Workouts dated after it are left out entirely.
    AsOf(NaiveDate),
}

impl SnapshotDate {
    pub fn day(self) -> NaiveDate {
        match self {
            Self::Today(day) | Self::AsOf(day) => day,
        }
    }

    /// Last workout date that may contribute, if bounded.
    pub fn through(self) -> Option<NaiveDate> {
        match self {
            Self::Today(_) => None,
            Self::AsOf(day) => Some(day),
        }
    }
}

/// Read side feeding the suggestion engine.
#[async_trait]
pub trait SuggestionStore: Send + Sync {
    async fn snapshot(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        date: SnapshotDate,
    ) -> Result<SuggestionInput, RepositoryError>;
}

pub(crate) fn parse_u32(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}

pub(crate) fn parse_optional_u32(
    column: &str,
    value: Option<i64>,
) -> Result<Option<u32>, RepositoryError> {
    value.map(|value| parse_u32(column, value)).transpose()
}

pub(crate) fn parse_date(column: &str, value: String) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(&value, WORKOUT_DATE_FORMAT).map_err(|error| {
        RepositoryError::Decode(format!("invalid date in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(WORKOUT_DATE_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.map(|timestamp| parse_timestamp(column, timestamp)).transpose()
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Opens a transaction that holds SQLite's write lock from its first
/// statement. A deferred transaction that reads before writing cannot wait
/// for a concurrent writer and fails with SQLITE_BUSY instead.
pub(crate) async fn begin_write(
    pool: &DbPool,
) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error.as_database_error().is_some_and(|db_error| db_error.is_unique_violation())
}
