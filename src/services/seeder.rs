//! 测试数据
//!
//! 空库启动时写入一组演示用户、肌肉、动作与训练，写入后设置种子标记

use anyhow::Context;
use chrono::{Days, NaiveDate, Utc};
use tracing::info;

use crate::domain::{InvolvementLevel, NewUser, NewWorkoutSet, ProfileFields, ResistanceType};
use crate::domain::InvolvementLevel::{Primary, Secondary};
use crate::state::store::Database;

use super::password::hash_password;

struct TestUser {
    email: &'static str,
    password: &'static str,
    username: &'static str,
    profile: Option<TestProfile>,
}

struct TestProfile {
    first_name: &'static str,
    last_name: &'static str,
    gender: &'static str,
    date_of_birth: (i32, u32, u32),
    height_inches: i32,
    weight_pounds: i32,
}

const TEST_USERS: &[TestUser] = &[
    TestUser {
        email: "aaron@test.com",
        password: "password123",
        username: "aaronhotard",
        profile: Some(TestProfile {
            first_name: "Aaron",
            last_name: "Hotard",
            gender: "Male",
            date_of_birth: (1999, 11, 19),
            height_inches: 74,
            weight_pounds: 185,
        }),
    },
    TestUser {
        email: "aiyana@test.com",
        password: "password456",
        username: "aiyanathomas",
        profile: Some(TestProfile {
            first_name: "Aiyana",
            last_name: "Thomas",
            gender: "Female",
            date_of_birth: (2000, 7, 5),
            height_inches: 63,
            weight_pounds: 130,
        }),
    },
    // 没有资料的用户
    TestUser {
        email: "hunter@test.com",
        password: "password789",
        username: "huntertracy",
        profile: None,
    },
];

/// (肌肉, 肌群)
const MUSCLES: &[(&str, &str)] = &[
    ("Pectoralis Major", "Chest"),
    ("Pectoralis Minor", "Chest"),
    ("Latissimus Dorsi", "Back"),
    ("Trapezius", "Back"),
    ("Rhomboids", "Back"),
    ("Teres Major", "Back"),
    ("Teres Minor", "Back"),
    ("Anterior Deltoid", "Shoulders"),
    ("Lateral Deltoid", "Shoulders"),
    ("Posterior Deltoid", "Shoulders"),
    ("Biceps Brachii", "Arms"),
    ("Triceps Brachii", "Arms"),
    ("Brachialis", "Arms"),
    ("Forearm Flexors", "Arms"),
    ("Forearm Extensors", "Arms"),
    ("Quadriceps", "Legs"),
    ("Hamstrings", "Legs"),
    ("Gastrocnemius", "Legs"),
    ("Soleus", "Legs"),
    ("Tibialis Anterior", "Legs"),
    ("Rectus Abdominis", "Core"),
    ("Obliques", "Core"),
    ("Transverse Abdominis", "Core"),
    ("Erector Spinae", "Lower Back"),
    ("Gluteus Maximus", "Glutes"),
    ("Gluteus Medius", "Glutes"),
    ("Gluteus Minimus", "Glutes"),
];

/// (动作, 描述)
const EXERCISES: &[(&str, &str)] = &[
    ("Bench Press", "A compound exercise performed lying on a bench, pushing a barbell up from the chest to full arm extension."),
    ("Overhead Press", "A standing compound exercise pressing a barbell or dumbbells from shoulder level to overhead."),
    ("Push-up", "A bodyweight exercise performed face-down, pushing the body up from the ground with arms."),
    ("Pull-up", "A bodyweight exercise pulling oneself up to a bar from a hanging position."),
    ("Barbell Row", "A bent-over pulling movement targeting the back muscles using a barbell."),
    ("Lat Pulldown", "A cable exercise pulling a bar down to the upper chest, targeting the latissimus dorsi."),
    ("Squat", "A fundamental lower body exercise performing a deep knee bend while keeping the torso upright."),
    ("Deadlift", "A compound exercise lifting a barbell from the ground while maintaining a neutral spine."),
    ("Romanian Deadlift", "A hip-hinge movement performed with straight legs, targeting the posterior chain."),
    ("Lunge", "A unilateral leg exercise stepping forward into a split stance position."),
    ("Bicep Curl", "An isolation exercise for the biceps, curling weight from full arm extension to maximum flexion."),
    ("Tricep Extension", "An isolation movement extending the arm to target the triceps."),
    ("Lateral Raise", "An isolation exercise raising dumbbells to the side to target the lateral deltoids."),
    ("Leg Extension", "A machine exercise extending the knee to target the quadriceps."),
    ("Leg Curl", "A machine exercise curling the leg to target the hamstrings."),
    ("Calf Raise", "An isolation exercise rising onto the toes to target the calf muscles."),
    ("Plank", "An isometric core exercise maintaining a straight body position supported on forearms and toes."),
    ("Russian Twist", "A rotational core exercise performed seated with the feet off the ground."),
    ("Crunch", "A basic abdominal exercise lifting the shoulders off the ground while lying on the back."),
];

/// (动作, 肌肉, 参与程度)
const EXERCISE_MUSCLES: &[(&str, &str, InvolvementLevel)] = &[
    ("Bench Press", "Pectoralis Major", Primary),
    ("Bench Press", "Anterior Deltoid", Secondary),
    ("Bench Press", "Triceps Brachii", Secondary),
    ("Overhead Press", "Anterior Deltoid", Primary),
    ("Overhead Press", "Triceps Brachii", Secondary),
    ("Push-up", "Pectoralis Major", Primary),
    ("Push-up", "Triceps Brachii", Secondary),
    ("Push-up", "Anterior Deltoid", Secondary),
    ("Pull-up", "Latissimus Dorsi", Primary),
    ("Pull-up", "Biceps Brachii", Secondary),
    ("Pull-up", "Posterior Deltoid", Secondary),
    ("Barbell Row", "Latissimus Dorsi", Primary),
    ("Barbell Row", "Biceps Brachii", Secondary),
    ("Barbell Row", "Posterior Deltoid", Secondary),
];

/// 未写入过测试数据时写入
///
/// 返回是否执行了写入
pub async fn seed_if_empty(db: &Database, bcrypt_cost: u32) -> anyhow::Result<bool> {
    if db.is_seeded().await {
        info!("Test data already present, skipping seed");
        return Ok(false);
    }

    // 在副本上写入，全部成功后再替换，失败时不留下部分数据
    let today = Utc::now().date_naive();
    let scratch = db.fork().await;
    seed(&scratch, bcrypt_cost, today).await?;
    scratch.mark_seeded().await;
    db.adopt(scratch).await;

    let counts = db.counts().await;
    info!(
        users = counts.users,
        muscles = counts.muscles,
        exercises = counts.exercises,
        workouts = counts.workouts,
        sets = counts.workout_sets,
        "Seeded test data"
    );
    Ok(true)
}

async fn seed(db: &Database, bcrypt_cost: u32, today: NaiveDate) -> anyhow::Result<()> {
    let mut first_user_id = None;
    for user in TEST_USERS {
        let password_hash = hash_password(user.password.to_string(), bcrypt_cost).await?;
        let created = db
            .create_user(NewUser {
                email: user.email.to_string(),
                username: user.username.to_string(),
                password_hash,
            })
            .await
            .with_context(|| format!("failed to seed user {}", user.email))?;
        first_user_id.get_or_insert(created.user_id);

        if let Some(profile) = &user.profile {
            let (y, m, d) = profile.date_of_birth;
            db.create_profile(
                created.user_id,
                ProfileFields {
                    first_name: Some(profile.first_name.to_string()),
                    last_name: Some(profile.last_name.to_string()),
                    date_of_birth: NaiveDate::from_ymd_opt(y, m, d),
                    gender: Some(profile.gender.to_string()),
                    height_inches: Some(profile.height_inches),
                    weight_pounds: Some(profile.weight_pounds),
                    profile_picture_url: None,
                },
            )
            .await
            .with_context(|| format!("failed to seed profile for {}", user.email))?;
        }
    }

    for (name, group) in MUSCLES {
        db.create_muscle(name, group)
            .await
            .with_context(|| format!("failed to seed muscle {}", name))?;
    }

    for (name, description) in EXERCISES {
        db.create_exercise(name, Some(description.to_string()))
            .await
            .with_context(|| format!("failed to seed exercise {}", name))?;
    }

    for (exercise, muscle, level) in EXERCISE_MUSCLES {
        let exercise_id = db.get_exercise_by_name(exercise).await?.exercise_id;
        let muscle_id = db.get_muscle_by_name(muscle).await?.muscle_id;
        db.link_muscle(exercise_id, muscle_id, *level)
            .await
            .with_context(|| format!("failed to link {} to {}", exercise, muscle))?;
    }

    let user_id = first_user_id.context("no test users defined")?;
    let upper = db
        .create_workout(user_id, today, Some("Upper Body 1".to_string()))
        .await
        .context("failed to seed workouts")?;
    if let Some(yesterday) = today.checked_sub_days(Days::new(1)) {
        db.create_workout(user_id, yesterday, Some("Lower Body 1".to_string()))
            .await
            .context("failed to seed workouts")?;
    }

    let bench = db.get_exercise_by_name("Bench Press").await?.exercise_id;
    let pullup = db.get_exercise_by_name("Pull-up").await?.exercise_id;

    let empty_set = NewWorkoutSet {
        workout_id: upper.workout_id,
        exercise_id: bench,
        ..Default::default()
    };
    let pullup_set = |reps: i32, notes: &str| NewWorkoutSet {
        workout_id: upper.workout_id,
        exercise_id: pullup,
        reps: Some(reps),
        resistance_type: Some(ResistanceType::Bodyweight),
        resistance_value: Some(0.0),
        resistance_detail: Some("Wide grip".to_string()),
        rpe: Some(8.5),
        notes: Some(notes.to_string()),
    };

    db.create_workout_sets(
        user_id,
        vec![
            empty_set.clone(),
            empty_set.clone(),
            empty_set,
            pullup_set(8, "Easy af"),
            pullup_set(8, "Less easy this time"),
            pullup_set(7, "Barely 7"),
        ],
    )
    .await
    .context("failed to seed workout sets")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::constants::MIN_BCRYPT_COST;

    #[tokio::test]
    async fn test_seed_populates_tables_once() {
        let db = Database::in_memory();
        assert!(seed_if_empty(&db, MIN_BCRYPT_COST).await.unwrap());

        let counts = db.counts().await;
        assert_eq!(counts.users, 3);
        assert_eq!(counts.profiles, 2);
        assert_eq!(counts.muscles, 27);
        assert_eq!(counts.exercises, 19);
        assert_eq!(counts.workouts, 2);
        assert_eq!(counts.workout_sets, 6);

        // 第二次启动不再写入
        assert!(!seed_if_empty(&db, MIN_BCRYPT_COST).await.unwrap());
        assert_eq!(db.counts().await.users, 3);
    }

    #[tokio::test]
    async fn test_seeded_relationships() {
        let db = Database::in_memory();
        seed_if_empty(&db, MIN_BCRYPT_COST).await.unwrap();

        let hunter = db.get_user_by_email("hunter@test.com").await.unwrap();
        assert!(db.get_profile(hunter.user_id).await.is_err());

        let bench = db.get_exercise_by_name("Bench Press").await.unwrap();
        let muscles = db.muscles_for_exercise(bench.exercise_id).await.unwrap();
        assert_eq!(muscles.len(), 3);
        assert_eq!(muscles[0].muscle_name, "Pectoralis Major");

        let groups: std::collections::BTreeSet<String> = db
            .list_muscles(None)
            .await
            .into_iter()
            .map(|m| m.muscle_group)
            .collect();
        assert_eq!(groups.len(), 8);

        let aaron = db.get_user_by_email("aaron@test.com").await.unwrap();
        let workouts = db.workouts_for_user(aaron.user_id).await;
        assert_eq!(workouts[0].title.as_deref(), Some("Upper Body 1"));
        let sets = db
            .sets_for_workout(workouts[0].workout_id, aaron.user_id)
            .await
            .unwrap();
        assert_eq!(sets.len(), 6);
        assert_eq!(sets[5].set.notes.as_deref(), Some("Barely 7"));
    }

    #[tokio::test]
    async fn test_failed_seed_leaves_no_partial_data() {
        let db = Database::in_memory();
        let existing = db
            .create_user(NewUser {
                email: "aaron@test.com".into(),
                username: "taken".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        assert!(seed_if_empty(&db, MIN_BCRYPT_COST).await.is_err());
        let counts = db.counts().await;
        assert_eq!(counts.users, 1);
        assert_eq!(counts.muscles, 0);
        assert!(!db.is_seeded().await);

        // 冲突解除后下次启动可以完整写入
        db.delete_user(existing.user_id).await.unwrap();
        assert!(seed_if_empty(&db, MIN_BCRYPT_COST).await.unwrap());
        assert_eq!(db.counts().await.users, 3);
        assert!(db.is_seeded().await);
    }
}
