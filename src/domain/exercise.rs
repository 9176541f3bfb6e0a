//! 肌肉与动作领域模型

use serde::{Deserialize, Serialize};

/// 肌肉
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Muscle {
    pub muscle_id: i32,
    pub muscle_name: String,
    pub muscle_group: String,
}

/// 训练动作
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub exercise_id: i32,
    pub exercise_name: String,
    pub description: Option<String>,
}

/// 动作对肌肉的参与程度
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvolvementLevel {
    Primary,
    Secondary,
}

impl InvolvementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvolvementLevel::Primary => "primary",
            InvolvementLevel::Secondary => "secondary",
        }
    }
}

/// 动作-肌肉关联
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseMuscle {
    pub exercise_id: i32,
    pub muscle_id: i32,
    pub involvement_level: InvolvementLevel,
}

/// 动作涉及的肌肉（关联查询结果）
#[derive(Clone, Debug, Serialize)]
pub struct ExerciseMuscleView {
    pub muscle_id: i32,
    pub muscle_name: String,
    pub muscle_group: String,
    pub involvement_level: InvolvementLevel,
}

/// 创建肌肉请求
#[derive(Debug, Deserialize)]
pub struct CreateMuscleRequest {
    #[serde(default)]
    pub muscle_name: String,
    #[serde(default)]
    pub muscle_group: String,
}

/// 肌肉查询参数
#[derive(Debug, Default, Deserialize)]
pub struct MuscleQuery {
    pub name: Option<String>,
    pub group: Option<String>,
}

/// 创建动作请求
#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    #[serde(default)]
    pub exercise_name: String,
    pub description: Option<String>,
}

/// 动作查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ExerciseQuery {
    pub name: Option<String>,
}

/// 关联肌肉请求
#[derive(Debug, Deserialize)]
pub struct LinkMuscleRequest {
    pub muscle_id: i32,
    pub involvement_level: InvolvementLevel,
}
