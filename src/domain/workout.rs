//! 训练记录领域模型

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// 训练
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub workout_id: i32,
    pub user_id: i32,
    /// 用户本地日历日期
    pub workout_date: NaiveDate,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 负重类型
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResistanceType {
    Weight,
    Band,
    Bodyweight,
}

impl std::str::FromStr for ResistanceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weight" => Ok(ResistanceType::Weight),
            "band" => Ok(ResistanceType::Band),
            "bodyweight" => Ok(ResistanceType::Bodyweight),
            other => Err(format!(
                "invalid resistance_type '{}': expected weight, band or bodyweight",
                other
            )),
        }
    }
}

/// 训练组
///
/// 由 (workout_id, exercise_id, set_number) 唯一确定
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub workout_id: i32,
    pub exercise_id: i32,
    pub set_number: i32,
    pub reps: Option<i32>,
    pub resistance_type: Option<ResistanceType>,
    pub resistance_value: Option<f64>,
    pub resistance_detail: Option<String>,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkoutSet {
    pub fn key(&self) -> (i32, i32, i32) {
        (self.workout_id, self.exercise_id, self.set_number)
    }
}

/// 带动作名称的训练组（关联查询结果）
#[derive(Clone, Debug, Serialize)]
pub struct WorkoutSetView {
    #[serde(flatten)]
    pub set: WorkoutSet,
    pub exercise_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_date: Option<NaiveDate>,
}

/// 已校验的新训练组（set_number 由存储层分配）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewWorkoutSet {
    pub workout_id: i32,
    pub exercise_id: i32,
    pub reps: Option<i32>,
    pub resistance_type: Option<ResistanceType>,
    pub resistance_value: Option<f64>,
    pub resistance_detail: Option<String>,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
}

/// 训练组更新，`None` 表示保持不变
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkoutSetChanges {
    pub reps: Option<i32>,
    pub resistance_type: Option<ResistanceType>,
    pub resistance_value: Option<f64>,
    pub resistance_detail: Option<String>,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
}

/// 创建训练请求
#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub title: Option<String>,
    /// RFC 3339 时间戳或 `YYYY-MM-DD`
    #[serde(rename = "clientworkoutdate")]
    pub client_workout_date: String,
}

/// 重命名训练请求
#[derive(Debug, Deserialize)]
pub struct UpdateWorkoutRequest {
    #[serde(rename = "workouttitle")]
    pub title: String,
}

/// 按日期查询参数
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

/// 单个训练组输入
#[derive(Debug, Deserialize)]
pub struct WorkoutSetInput {
    pub workout_id: i32,
    pub exercise_id: i32,
    /// 客户端传入的组号会被忽略，组号由服务端顺序分配
    #[serde(default)]
    pub set_number: Option<i32>,
    pub reps: Option<i32>,
    pub resistance_type: Option<String>,
    pub resistance_value: Option<f64>,
    pub resistance_detail: Option<String>,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
}

impl WorkoutSetInput {
    pub fn validate(self) -> Result<NewWorkoutSet, String> {
        Ok(NewWorkoutSet {
            workout_id: self.workout_id,
            exercise_id: self.exercise_id,
            reps: validate_reps(self.reps)?,
            resistance_type: self
                .resistance_type
                .as_deref()
                .map(str::parse::<ResistanceType>)
                .transpose()?,
            resistance_value: validate_resistance(self.resistance_value)?,
            resistance_detail: self.resistance_detail,
            rpe: validate_rpe(self.rpe)?,
            notes: self.notes,
        })
    }
}

/// 批量创建训练组请求
#[derive(Debug, Deserialize)]
pub struct CreateWorkoutSetsRequest {
    pub sets: Vec<WorkoutSetInput>,
}

/// 更新训练组请求
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWorkoutSetRequest {
    pub reps: Option<i32>,
    pub resistance_type: Option<String>,
    pub resistance_value: Option<f64>,
    pub resistance_detail: Option<String>,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
}

impl UpdateWorkoutSetRequest {
    pub fn validate(self) -> Result<WorkoutSetChanges, String> {
        Ok(WorkoutSetChanges {
            reps: validate_reps(self.reps)?,
            resistance_type: self
                .resistance_type
                .as_deref()
                .map(str::parse::<ResistanceType>)
                .transpose()?,
            resistance_value: validate_resistance(self.resistance_value)?,
            resistance_detail: self.resistance_detail,
            rpe: validate_rpe(self.rpe)?,
            notes: self.notes,
        })
    }
}

fn validate_reps(reps: Option<i32>) -> Result<Option<i32>, String> {
    match reps {
        Some(r) if r < 0 => Err("reps cannot be negative".to_string()),
        other => Ok(other),
    }
}

fn validate_resistance(value: Option<f64>) -> Result<Option<f64>, String> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err("resistance_value must be a non-negative number".to_string())
        }
        Some(v) => Ok(Some(round_one_decimal(v))),
        None => Ok(None),
    }
}

/// RPE 范围 1.0 - 10.0，保留一位小数
fn validate_rpe(rpe: Option<f64>) -> Result<Option<f64>, String> {
    match rpe {
        Some(v) if !(1.0..=10.0).contains(&v) => Err("rpe must be between 1 and 10".to_string()),
        Some(v) => Ok(Some(round_one_decimal(v))),
        None => Ok(None),
    }
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// 解析 `X-User-Timezone`，缺省为 UTC
pub fn parse_timezone(header: Option<&str>) -> Result<Tz, String> {
    match header.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| format!("invalid timezone: unknown time zone {}", name)),
    }
}

/// 将客户端时间转换为客户端所在时区的日历日期
///
/// `YYYY-MM-DD` 原样使用；RFC 3339 时间戳换算到 `tz` 后取日期
pub fn client_calendar_date(raw: &str, tz: Tz) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .map_err(|_| "Invalid clientworkoutdate; use RFC 3339 or YYYY-MM-DD".to_string())
}
