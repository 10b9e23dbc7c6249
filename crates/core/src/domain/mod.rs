pub mod body_area;
pub mod exercise;
pub mod plan;
pub mod user;
pub mod workout;
