//! 领域模型模块
//!
//! 纯数据结构与校验，不依赖 axum/tokio

pub mod exercise;
pub mod user;
pub mod workout;

// Re-exports for convenience
pub use exercise::{Exercise, ExerciseMuscle, ExerciseMuscleView, InvolvementLevel, Muscle};
pub use user::{NewUser, ProfileFields, User, UserChanges, UserProfile, UserView};
pub use workout::{
    NewWorkoutSet, ResistanceType, Workout, WorkoutSet, WorkoutSetChanges, WorkoutSetView,
};
