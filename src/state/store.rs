//! 数据存储
//!
//! 内存数据表 + 唯一约束、外键检查与级联删除。配置了快照文件时，
//! 每次写操作后把全部数据表落盘。

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};
use tracing::error;

use crate::domain::{
    Exercise, ExerciseMuscle, ExerciseMuscleView, InvolvementLevel, Muscle, NewUser,
    NewWorkoutSet, ProfileFields, User, UserChanges, UserProfile, Workout, WorkoutSet,
    WorkoutSetChanges, WorkoutSetView,
};

use super::persistence::SnapshotFile;

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 记录不存在，参数为资源名
    #[error("{0} not found")]
    NotFound(&'static str),
    /// 违反唯一约束
    #[error("{0}")]
    Conflict(String),
    /// 引用的记录不存在
    #[error("{0}")]
    InvalidReference(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 自增序列
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Sequences {
    pub user: i32,
    pub profile: i32,
    pub muscle: i32,
    pub exercise: i32,
    pub workout: i32,
}

/// 全部数据表
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    pub users: BTreeMap<i32, User>,
    /// 以 user_id 为键，每个用户最多一份资料
    pub profiles: BTreeMap<i32, UserProfile>,
    pub muscles: BTreeMap<i32, Muscle>,
    pub exercises: BTreeMap<i32, Exercise>,
    pub exercise_muscles: Vec<ExerciseMuscle>,
    pub workouts: BTreeMap<i32, Workout>,
    pub workout_sets: Vec<WorkoutSet>,
    pub sequences: Sequences,
    /// 测试数据是否已写入
    pub seeded: bool,
}

/// 各表记录数
#[derive(Clone, Debug, Serialize)]
pub struct StoreCounts {
    pub users: usize,
    pub profiles: usize,
    pub muscles: usize,
    pub exercises: usize,
    pub workouts: usize,
    pub workout_sets: usize,
}

impl Tables {
    fn workout_owned(&self, workout_id: i32, user_id: i32) -> StoreResult<&Workout> {
        self.workouts
            .get(&workout_id)
            .filter(|w| w.user_id == user_id)
            .ok_or(StoreError::NotFound("Workout"))
    }

    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.user_id) != except && u.email.eq_ignore_ascii_case(email))
    }

    fn username_taken(&self, username: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.user_id) != except && u.username.eq_ignore_ascii_case(username))
    }

    fn exercise_name(&self, exercise_id: i32) -> String {
        self.exercises
            .get(&exercise_id)
            .map(|e| e.exercise_name.clone())
            .unwrap_or_default()
    }

    fn next_set_number(&self, workout_id: i32, exercise_id: i32) -> i32 {
        self.workout_sets
            .iter()
            .filter(|s| s.workout_id == workout_id && s.exercise_id == exercise_id)
            .map(|s| s.set_number)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// 数据库
pub struct Database {
    tables: RwLock<Tables>,
    snapshot: Option<SnapshotFile>,
    /// 数据版本，持有写锁时递增
    generation: AtomicU64,
    /// 已落盘的数据版本，同时串行化文件写入
    persisted: Mutex<u64>,
}

impl Database {
    /// 纯内存数据库
    pub fn in_memory() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            snapshot: None,
            generation: AtomicU64::new(0),
            persisted: Mutex::new(0),
        }
    }

    /// 打开带快照的数据库，快照存在时恢复数据
    pub async fn open(snapshot: SnapshotFile) -> Self {
        let tables = snapshot.load().await.unwrap_or_default();
        Self {
            tables: RwLock::new(tables),
            snapshot: Some(snapshot),
            generation: AtomicU64::new(0),
            persisted: Mutex::new(0),
        }
    }

    /// 当前数据的纯内存副本，在副本上的写入不会落盘
    pub async fn fork(&self) -> Database {
        let tables = self.tables.read().await.clone();
        Database {
            tables: RwLock::new(tables),
            ..Database::in_memory()
        }
    }

    /// 用副本的数据整体替换当前数据（仅在启动阶段使用，期间的其他写入会丢失）
    pub async fn adopt(&self, fork: Database) {
        let mut t = self.tables.write().await;
        *t = fork.tables.into_inner();
        self.commit(t).await;
    }

    /// 写操作完成后落盘
    ///
    /// 持有写锁时序列化，释放锁后再写文件；较旧的版本不会覆盖较新的快照。
    /// 落盘失败只记录日志，内存数据仍然有效，关闭时会再次 flush
    async fn commit(&self, tables: RwLockWriteGuard<'_, Tables>) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let encoded = SnapshotFile::encode(&tables);
        drop(tables);

        match encoded {
            Ok(content) => self.persist(snapshot, generation, &content).await,
            Err(e) => error!(error = %e, "Failed to serialize snapshot"),
        }
    }

    async fn persist(&self, snapshot: &SnapshotFile, generation: u64, content: &[u8]) {
        let mut persisted = self.persisted.lock().await;
        if *persisted >= generation {
            return;
        }
        match snapshot.write(content).await {
            Ok(()) => *persisted = generation,
            Err(e) => {
                error!(path = %snapshot.path().display(), error = %e, "Failed to persist snapshot")
            }
        }
    }

    /// 强制落盘（关闭时调用）
    pub async fn flush(&self) -> anyhow::Result<()> {
        let Some(snapshot) = &self.snapshot else {
            return Ok(());
        };
        let tables = self.tables.read().await;
        let generation = self.generation.load(Ordering::SeqCst);
        let content = SnapshotFile::encode(&tables)?;
        drop(tables);

        let mut persisted = self.persisted.lock().await;
        snapshot.write(&content).await?;
        *persisted = (*persisted).max(generation);
        Ok(())
    }

    pub async fn counts(&self) -> StoreCounts {
        let t = self.tables.read().await;
        StoreCounts {
            users: t.users.len(),
            profiles: t.profiles.len(),
            muscles: t.muscles.len(),
            exercises: t.exercises.len(),
            workouts: t.workouts.len(),
            workout_sets: t.workout_sets.len(),
        }
    }

    // ========== 种子标记 ==========

    pub async fn is_seeded(&self) -> bool {
        self.tables.read().await.seeded
    }

    pub async fn mark_seeded(&self) {
        let mut t = self.tables.write().await;
        t.seeded = true;
        self.commit(t).await;
    }

    // ========== 用户 ==========

    pub async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.email_taken(&new.email, None) {
            return Err(StoreError::Conflict("Email already in use".into()));
        }
        if t.username_taken(&new.username, None) {
            return Err(StoreError::Conflict("Username already in use".into()));
        }

        t.sequences.user += 1;
        let now = Utc::now();
        let user = User {
            user_id: t.sequences.user,
            email: new.email,
            username: new.username,
            password_hash: new.password_hash,
            active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.user_id, user.clone());
        self.commit(t).await;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i32) -> StoreResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    pub async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or(StoreError::NotFound("User"))
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.tables.read().await.users.values().cloned().collect()
    }

    pub async fn update_user(&self, user_id: i32, changes: UserChanges) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("User"));
        }
        if let Some(email) = &changes.email {
            if t.email_taken(email, Some(user_id)) {
                return Err(StoreError::Conflict("Email already in use".into()));
            }
        }
        if let Some(username) = &changes.username {
            if t.username_taken(username, Some(user_id)) {
                return Err(StoreError::Conflict("Username already in use".into()));
            }
        }

        let user = t
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        let user = user.clone();
        self.commit(t).await;
        Ok(user)
    }

    pub async fn update_last_login(&self, user_id: i32) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let user = t
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User"))?;
        user.last_login = Some(Utc::now());
        self.commit(t).await;
        Ok(())
    }

    /// 删除用户，同时删除其资料、训练及训练组
    pub async fn delete_user(&self, user_id: i32) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        let user = t
            .users
            .remove(&user_id)
            .ok_or(StoreError::NotFound("User"))?;

        t.profiles.remove(&user_id);
        let workout_ids: Vec<i32> = t
            .workouts
            .values()
            .filter(|w| w.user_id == user_id)
            .map(|w| w.workout_id)
            .collect();
        t.workouts.retain(|_, w| w.user_id != user_id);
        t.workout_sets
            .retain(|s| !workout_ids.contains(&s.workout_id));

        self.commit(t).await;
        Ok(user)
    }

    // ========== 用户资料 ==========

    pub async fn create_profile(
        &self,
        user_id: i32,
        fields: ProfileFields,
    ) -> StoreResult<UserProfile> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user_id) {
            return Err(StoreError::InvalidReference(format!(
                "User {} does not exist",
                user_id
            )));
        }
        if t.profiles.contains_key(&user_id) {
            return Err(StoreError::Conflict("User profile already exists".into()));
        }

        t.sequences.profile += 1;
        let now = Utc::now();
        let profile = UserProfile {
            profile_id: t.sequences.profile,
            user_id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            date_of_birth: fields.date_of_birth,
            gender: fields.gender,
            height_inches: fields.height_inches,
            weight_pounds: fields.weight_pounds,
            profile_picture_url: fields.profile_picture_url,
            created_at: now,
            updated_at: now,
        };
        t.profiles.insert(user_id, profile.clone());
        self.commit(t).await;
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: i32) -> StoreResult<UserProfile> {
        self.tables
            .read()
            .await
            .profiles
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound("User profile"))
    }

    /// 活跃用户的资料
    pub async fn list_active_profiles(&self) -> Vec<UserProfile> {
        let t = self.tables.read().await;
        t.profiles
            .values()
            .filter(|p| t.users.get(&p.user_id).is_some_and(|u| u.active))
            .cloned()
            .collect()
    }

    /// 部分更新资料，`None` 字段保持不变
    pub async fn update_profile(
        &self,
        user_id: i32,
        fields: ProfileFields,
    ) -> StoreResult<UserProfile> {
        let mut t = self.tables.write().await;
        let profile = t
            .profiles
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound("User profile"))?;

        if let Some(v) = fields.first_name {
            profile.first_name = Some(v);
        }
        if let Some(v) = fields.last_name {
            profile.last_name = Some(v);
        }
        if let Some(v) = fields.date_of_birth {
            profile.date_of_birth = Some(v);
        }
        if let Some(v) = fields.gender {
            profile.gender = Some(v);
        }
        if let Some(v) = fields.height_inches {
            profile.height_inches = Some(v);
        }
        if let Some(v) = fields.weight_pounds {
            profile.weight_pounds = Some(v);
        }
        if let Some(v) = fields.profile_picture_url {
            profile.profile_picture_url = Some(v);
        }
        profile.updated_at = Utc::now();

        let profile = profile.clone();
        self.commit(t).await;
        Ok(profile)
    }

    pub async fn delete_profile(&self, user_id: i32) -> StoreResult<UserProfile> {
        let mut t = self.tables.write().await;
        let profile = t
            .profiles
            .remove(&user_id)
            .ok_or(StoreError::NotFound("User profile"))?;
        self.commit(t).await;
        Ok(profile)
    }

    // ========== 肌肉 ==========

    pub async fn create_muscle(&self, name: &str, group: &str) -> StoreResult<Muscle> {
        let mut t = self.tables.write().await;
        if t
            .muscles
            .values()
            .any(|m| m.muscle_name.eq_ignore_ascii_case(name))
        {
            return Err(StoreError::Conflict(format!("Muscle '{}' already exists", name)));
        }

        t.sequences.muscle += 1;
        let muscle = Muscle {
            muscle_id: t.sequences.muscle,
            muscle_name: name.to_string(),
            muscle_group: group.to_string(),
        };
        t.muscles.insert(muscle.muscle_id, muscle.clone());
        self.commit(t).await;
        Ok(muscle)
    }

    pub async fn get_muscle_by_name(&self, name: &str) -> StoreResult<Muscle> {
        self.tables
            .read()
            .await
            .muscles
            .values()
            .find(|m| m.muscle_name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or(StoreError::NotFound("Muscle"))
    }

    /// 列出肌肉，可按肌群过滤
    pub async fn list_muscles(&self, group: Option<&str>) -> Vec<Muscle> {
        self.tables
            .read()
            .await
            .muscles
            .values()
            .filter(|m| group.map_or(true, |g| m.muscle_group.eq_ignore_ascii_case(g)))
            .cloned()
            .collect()
    }

    /// 按名称删除肌肉，同时删除动作关联
    pub async fn delete_muscle_by_name(&self, name: &str) -> StoreResult<Muscle> {
        let mut t = self.tables.write().await;
        let muscle_id = t
            .muscles
            .values()
            .find(|m| m.muscle_name.eq_ignore_ascii_case(name))
            .map(|m| m.muscle_id)
            .ok_or(StoreError::NotFound("Muscle"))?;

        let muscle = t
            .muscles
            .remove(&muscle_id)
            .ok_or(StoreError::NotFound("Muscle"))?;
        t.exercise_muscles.retain(|em| em.muscle_id != muscle_id);
        self.commit(t).await;
        Ok(muscle)
    }

    // ========== 动作 ==========

    pub async fn create_exercise(
        &self,
        name: &str,
        description: Option<String>,
    ) -> StoreResult<Exercise> {
        let mut t = self.tables.write().await;
        if t
            .exercises
            .values()
            .any(|e| e.exercise_name.eq_ignore_ascii_case(name))
        {
            return Err(StoreError::Conflict(format!("Exercise '{}' already exists", name)));
        }

        t.sequences.exercise += 1;
        let exercise = Exercise {
            exercise_id: t.sequences.exercise,
            exercise_name: name.to_string(),
            description,
        };
        t.exercises.insert(exercise.exercise_id, exercise.clone());
        self.commit(t).await;
        Ok(exercise)
    }

    pub async fn get_exercise(&self, exercise_id: i32) -> StoreResult<Exercise> {
        self.tables
            .read()
            .await
            .exercises
            .get(&exercise_id)
            .cloned()
            .ok_or(StoreError::NotFound("Exercise"))
    }

    pub async fn get_exercise_by_name(&self, name: &str) -> StoreResult<Exercise> {
        self.tables
            .read()
            .await
            .exercises
            .values()
            .find(|e| e.exercise_name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or(StoreError::NotFound("Exercise"))
    }

    pub async fn list_exercises(&self) -> Vec<Exercise> {
        self.tables.read().await.exercises.values().cloned().collect()
    }

    /// 删除动作，同时删除训练组与肌肉关联
    pub async fn delete_exercise(&self, exercise_id: i32) -> StoreResult<Exercise> {
        let mut t = self.tables.write().await;
        let exercise = t
            .exercises
            .remove(&exercise_id)
            .ok_or(StoreError::NotFound("Exercise"))?;
        t.workout_sets.retain(|s| s.exercise_id != exercise_id);
        t.exercise_muscles.retain(|em| em.exercise_id != exercise_id);
        self.commit(t).await;
        Ok(exercise)
    }

    pub async fn link_muscle(
        &self,
        exercise_id: i32,
        muscle_id: i32,
        level: InvolvementLevel,
    ) -> StoreResult<ExerciseMuscle> {
        let mut t = self.tables.write().await;
        if !t.exercises.contains_key(&exercise_id) {
            return Err(StoreError::NotFound("Exercise"));
        }
        if !t.muscles.contains_key(&muscle_id) {
            return Err(StoreError::InvalidReference(format!(
                "Muscle {} does not exist",
                muscle_id
            )));
        }
        if t
            .exercise_muscles
            .iter()
            .any(|em| em.exercise_id == exercise_id && em.muscle_id == muscle_id)
        {
            return Err(StoreError::Conflict(
                "Muscle is already linked to this exercise".into(),
            ));
        }

        let link = ExerciseMuscle {
            exercise_id,
            muscle_id,
            involvement_level: level,
        };
        t.exercise_muscles.push(link.clone());
        self.commit(t).await;
        Ok(link)
    }

    /// 动作涉及的肌肉，主要肌群在前
    pub async fn muscles_for_exercise(
        &self,
        exercise_id: i32,
    ) -> StoreResult<Vec<ExerciseMuscleView>> {
        let t = self.tables.read().await;
        if !t.exercises.contains_key(&exercise_id) {
            return Err(StoreError::NotFound("Exercise"));
        }

        let mut views: Vec<ExerciseMuscleView> = t
            .exercise_muscles
            .iter()
            .filter(|em| em.exercise_id == exercise_id)
            .filter_map(|em| {
                t.muscles.get(&em.muscle_id).map(|m| ExerciseMuscleView {
                    muscle_id: m.muscle_id,
                    muscle_name: m.muscle_name.clone(),
                    muscle_group: m.muscle_group.clone(),
                    involvement_level: em.involvement_level,
                })
            })
            .collect();
        views.sort_by_key(|v| (v.involvement_level != InvolvementLevel::Primary, v.muscle_id));
        Ok(views)
    }

    // ========== 训练 ==========

    /// 创建训练，同一用户同一天只允许一条
    pub async fn create_workout(
        &self,
        user_id: i32,
        workout_date: NaiveDate,
        title: Option<String>,
    ) -> StoreResult<Workout> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user_id) {
            return Err(StoreError::InvalidReference(format!(
                "User {} does not exist",
                user_id
            )));
        }
        if t
            .workouts
            .values()
            .any(|w| w.user_id == user_id && w.workout_date == workout_date)
        {
            return Err(StoreError::Conflict(format!(
                "A workout already exists on {}",
                workout_date
            )));
        }

        t.sequences.workout += 1;
        let now = Utc::now();
        let workout = Workout {
            workout_id: t.sequences.workout,
            user_id,
            workout_date,
            title,
            created_at: now,
            updated_at: now,
        };
        t.workouts.insert(workout.workout_id, workout.clone());
        self.commit(t).await;
        Ok(workout)
    }

    /// 用户全部训练，日期倒序
    pub async fn workouts_for_user(&self, user_id: i32) -> Vec<Workout> {
        let t = self.tables.read().await;
        let mut workouts: Vec<Workout> = t
            .workouts
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        workouts.sort_by(|a, b| {
            b.workout_date
                .cmp(&a.workout_date)
                .then(b.workout_id.cmp(&a.workout_id))
        });
        workouts
    }

    pub async fn get_workout_for_user(&self, workout_id: i32, user_id: i32) -> StoreResult<Workout> {
        let t = self.tables.read().await;
        t.workout_owned(workout_id, user_id).cloned()
    }

    pub async fn workout_by_user_and_date(
        &self,
        user_id: i32,
        date: NaiveDate,
    ) -> StoreResult<Workout> {
        self.tables
            .read()
            .await
            .workouts
            .values()
            .find(|w| w.user_id == user_id && w.workout_date == date)
            .cloned()
            .ok_or(StoreError::NotFound("Workout"))
    }

    pub async fn rename_workout(
        &self,
        workout_id: i32,
        user_id: i32,
        title: Option<String>,
    ) -> StoreResult<Workout> {
        let mut t = self.tables.write().await;
        t.workout_owned(workout_id, user_id)?;
        let workout = t
            .workouts
            .get_mut(&workout_id)
            .ok_or(StoreError::NotFound("Workout"))?;
        workout.title = title;
        workout.updated_at = Utc::now();
        let workout = workout.clone();
        self.commit(t).await;
        Ok(workout)
    }

    /// 删除训练及其训练组，返回被删除的 ID
    pub async fn delete_workout(&self, workout_id: i32, user_id: i32) -> StoreResult<i32> {
        let mut t = self.tables.write().await;
        t.workout_owned(workout_id, user_id)?;
        t.workouts.remove(&workout_id);
        t.workout_sets.retain(|s| s.workout_id != workout_id);
        self.commit(t).await;
        Ok(workout_id)
    }

    // ========== 训练组 ==========

    /// 批量创建训练组
    ///
    /// 全部校验通过才写入。组号按 (workout, exercise) 从现有最大组号之后顺序分配。
    pub async fn create_workout_sets(
        &self,
        user_id: i32,
        sets: Vec<NewWorkoutSet>,
    ) -> StoreResult<Vec<WorkoutSet>> {
        let mut t = self.tables.write().await;

        for set in &sets {
            t.workout_owned(set.workout_id, user_id)?;
            if !t.exercises.contains_key(&set.exercise_id) {
                return Err(StoreError::InvalidReference(format!(
                    "Exercise {} does not exist",
                    set.exercise_id
                )));
            }
        }

        let now = Utc::now();
        let mut next_numbers: HashMap<(i32, i32), i32> = HashMap::new();
        let mut created = Vec::with_capacity(sets.len());
        for set in sets {
            let key = (set.workout_id, set.exercise_id);
            let number = next_numbers
                .entry(key)
                .or_insert_with(|| t.next_set_number(key.0, key.1));
            let set_number = *number;
            *number += 1;

            created.push(WorkoutSet {
                workout_id: set.workout_id,
                exercise_id: set.exercise_id,
                set_number,
                reps: set.reps,
                resistance_type: set.resistance_type,
                resistance_value: set.resistance_value,
                resistance_detail: set.resistance_detail,
                rpe: set.rpe,
                notes: set.notes,
                created_at: now,
            });
        }

        t.workout_sets.extend(created.iter().cloned());
        self.commit(t).await;
        Ok(created)
    }

    /// 训练的全部组，按动作、组号排序
    pub async fn sets_for_workout(
        &self,
        workout_id: i32,
        user_id: i32,
    ) -> StoreResult<Vec<WorkoutSetView>> {
        let t = self.tables.read().await;
        t.workout_owned(workout_id, user_id)?;

        let mut sets: Vec<WorkoutSetView> = t
            .workout_sets
            .iter()
            .filter(|s| s.workout_id == workout_id)
            .map(|s| WorkoutSetView {
                set: s.clone(),
                exercise_name: t.exercise_name(s.exercise_id),
                workout_date: None,
            })
            .collect();
        sets.sort_by_key(|v| (v.set.exercise_id, v.set.set_number));
        Ok(sets)
    }

    /// 用户某天的全部组
    pub async fn sets_for_user_on_date(
        &self,
        user_id: i32,
        date: NaiveDate,
    ) -> Vec<WorkoutSetView> {
        let t = self.tables.read().await;
        let mut sets: Vec<WorkoutSetView> = t
            .workout_sets
            .iter()
            .filter_map(|s| {
                let workout = t.workouts.get(&s.workout_id)?;
                (workout.user_id == user_id && workout.workout_date == date).then(|| {
                    WorkoutSetView {
                        set: s.clone(),
                        exercise_name: t.exercise_name(s.exercise_id),
                        workout_date: Some(workout.workout_date),
                    }
                })
            })
            .collect();
        sets.sort_by(|a, b| {
            a.set
                .created_at
                .cmp(&b.set.created_at)
                .then(a.set.exercise_id.cmp(&b.set.exercise_id))
                .then(a.set.set_number.cmp(&b.set.set_number))
        });
        sets
    }

    pub async fn update_workout_set(
        &self,
        user_id: i32,
        key: (i32, i32, i32),
        changes: WorkoutSetChanges,
    ) -> StoreResult<WorkoutSet> {
        let mut t = self.tables.write().await;
        t.workout_owned(key.0, user_id)?;
        let set = t
            .workout_sets
            .iter_mut()
            .find(|s| s.key() == key)
            .ok_or(StoreError::NotFound("Workout set"))?;

        if let Some(v) = changes.reps {
            set.reps = Some(v);
        }
        if let Some(v) = changes.resistance_type {
            set.resistance_type = Some(v);
        }
        if let Some(v) = changes.resistance_value {
            set.resistance_value = Some(v);
        }
        if let Some(v) = changes.resistance_detail {
            set.resistance_detail = Some(v);
        }
        if let Some(v) = changes.rpe {
            set.rpe = Some(v);
        }
        if let Some(v) = changes.notes {
            set.notes = Some(v);
        }

        let set = set.clone();
        self.commit(t).await;
        Ok(set)
    }

    pub async fn delete_workout_set(
        &self,
        user_id: i32,
        key: (i32, i32, i32),
    ) -> StoreResult<WorkoutSet> {
        let mut t = self.tables.write().await;
        t.workout_owned(key.0, user_id)?;
        let index = t
            .workout_sets
            .iter()
            .position(|s| s.key() == key)
            .ok_or(StoreError::NotFound("Workout set"))?;
        let set = t.workout_sets.remove(index);
        self.commit(t).await;
        Ok(set)
    }

    /// 删除训练中某个动作的全部组，返回删除数量
    pub async fn delete_sets_for_exercise(
        &self,
        user_id: i32,
        workout_id: i32,
        exercise_id: i32,
    ) -> StoreResult<usize> {
        let mut t = self.tables.write().await;
        t.workout_owned(workout_id, user_id)?;
        let before = t.workout_sets.len();
        t.workout_sets
            .retain(|s| !(s.workout_id == workout_id && s.exercise_id == exercise_id));
        let removed = before - t.workout_sets.len();
        if removed > 0 {
            self.commit(t).await;
        }
        Ok(removed)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::in_memory()
    }
}
