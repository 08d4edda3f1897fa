use anyhow::Result;
use chrono::{NaiveTime, Utc};

use crate::models::{Exercise, MuscleGroup, Trainer, Training};
use crate::storage::Store;

/// Fills empty catalog collections with the studio's default content.
/// Collections that already hold records are left untouched.
pub struct CatalogSeeder {
    store: Store,
}

impl CatalogSeeder {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("Seeding catalog...");

        self.seed_trainers().await?;
        self.seed_trainings().await?;
        self.seed_muscle_groups().await?;
        self.seed_exercises().await?;

        tracing::info!("Catalog seeding completed");
        Ok(())
    }

    async fn seed_trainers(&self) -> Result<()> {
        if !self.store.list_trainers().await?.is_empty() {
            return Ok(());
        }

        let trainers = [
            ("trainer_1", "Anna Petrova", "Yoga and stretching", 8, 4.9),
            ("trainer_2", "Mikhail Ivanov", "Strength training", 12, 4.8),
            ("trainer_3", "Elena Sidorova", "Cardio and HIIT", 6, 4.7),
            ("trainer_4", "Olga Kozlova", "Mobility and recovery", 10, 4.9),
        ];

        for (id, name, specialty, experience_years, rating) in trainers {
            self.store
                .insert_trainer(Trainer {
                    id: id.to_string(),
                    name: name.to_string(),
                    specialty: specialty.to_string(),
                    experience_years,
                    rating,
                    photo_url: None,
                    description: String::new(),
                    created_at: Utc::now(),
                })
                .await?;
        }

        tracing::info!("Seeded {} trainers", trainers.len());
        Ok(())
    }

    async fn seed_trainings(&self) -> Result<()> {
        if !self.store.list_trainings().await?.is_empty() {
            return Ok(());
        }

        let trainings = [
            (
                "training_1",
                "trainer_1",
                "Morning yoga",
                "A calm practice to start the day",
                "yoga",
                "beginner",
                (8, 0),
                60,
                15,
                800.0,
            ),
            (
                "training_2",
                "trainer_2",
                "Strength training",
                "Full-body work with free weights",
                "strength",
                "intermediate",
                (18, 0),
                90,
                10,
                1200.0,
            ),
            (
                "training_3",
                "trainer_3",
                "Cardio HIIT",
                "High-intensity interval training",
                "cardio",
                "advanced",
                (19, 30),
                45,
                20,
                1000.0,
            ),
            (
                "training_4",
                "trainer_4",
                "Stretching and relaxation",
                "Gentle stretching for recovery",
                "stretching",
                "beginner",
                (20, 0),
                75,
                12,
                700.0,
            ),
        ];

        let now = Utc::now();
        for (id, trainer_id, title, description, category, difficulty, (hour, minute), duration, capacity, price) in
            trainings
        {
            let start_time = NaiveTime::from_hms_opt(hour, minute, 0)
                .ok_or_else(|| anyhow::anyhow!("Invalid start time for {}", id))?;

            self.store
                .insert_training(Training {
                    id: id.to_string(),
                    trainer_id: trainer_id.to_string(),
                    title: title.to_string(),
                    description: description.to_string(),
                    category: category.to_string(),
                    difficulty: difficulty.to_string(),
                    start_time,
                    duration_minutes: duration,
                    capacity,
                    price,
                    current_bookings: 0,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
        }

        tracing::info!("Seeded {} trainings", trainings.len());
        Ok(())
    }

    async fn seed_muscle_groups(&self) -> Result<()> {
        if !self.store.list_muscle_groups().await?.is_empty() {
            return Ok(());
        }

        let groups = [
            ("chest", "Chest", "Pectoral muscles"),
            ("back", "Back", "Latissimus, trapezius and spinal erectors"),
            ("legs", "Legs", "Quadriceps, hamstrings and calves"),
            ("shoulders", "Shoulders", "Deltoid muscles"),
            ("arms", "Arms", "Biceps, triceps and forearms"),
            ("core", "Core", "Abdominals and obliques"),
        ];

        for (id, name, description) in groups {
            self.store
                .insert_muscle_group(MuscleGroup {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .await?;
        }

        tracing::info!("Seeded {} muscle groups", groups.len());
        Ok(())
    }

    async fn seed_exercises(&self) -> Result<()> {
        if !self.store.list_exercises(None).await?.is_empty() {
            return Ok(());
        }

        let exercises = vec![
            Exercise {
                id: "exercise_1".to_string(),
                name: "Bench press".to_string(),
                muscle_group_id: "chest".to_string(),
                category: "strength".to_string(),
                difficulty: "medium".to_string(),
                description: "Barbell press lying on a flat bench".to_string(),
                technique: "Lower the bar to mid-chest, keep the shoulder blades retracted, press up".to_string(),
                tips: vec![
                    "Keep your feet flat on the floor".to_string(),
                    "Do not bounce the bar off the chest".to_string(),
                ],
                gif_url: None,
            },
            Exercise {
                id: "exercise_2".to_string(),
                name: "Pull-up".to_string(),
                muscle_group_id: "back".to_string(),
                category: "strength".to_string(),
                difficulty: "hard".to_string(),
                description: "Bodyweight pull to the bar".to_string(),
                technique: "Start from a dead hang and pull until the chin clears the bar".to_string(),
                tips: vec!["Avoid swinging".to_string()],
                gif_url: None,
            },
            Exercise {
                id: "exercise_3".to_string(),
                name: "Back squat".to_string(),
                muscle_group_id: "legs".to_string(),
                category: "strength".to_string(),
                difficulty: "medium".to_string(),
                description: "Barbell squat with the bar on the upper back".to_string(),
                technique: "Sit back and down until thighs are parallel, drive up through the heels".to_string(),
                tips: vec![
                    "Keep the knees tracking over the toes".to_string(),
                    "Brace the core before each rep".to_string(),
                ],
                gif_url: None,
            },
            Exercise {
                id: "exercise_4".to_string(),
                name: "Overhead press".to_string(),
                muscle_group_id: "shoulders".to_string(),
                category: "strength".to_string(),
                difficulty: "medium".to_string(),
                description: "Standing barbell press overhead".to_string(),
                technique: "Press from the front rack to lockout, moving the head out of the bar path".to_string(),
                tips: vec!["Squeeze the glutes to protect the lower back".to_string()],
                gif_url: None,
            },
            Exercise {
                id: "exercise_5".to_string(),
                name: "Biceps curl".to_string(),
                muscle_group_id: "arms".to_string(),
                category: "strength".to_string(),
                difficulty: "easy".to_string(),
                description: "Dumbbell curl for the biceps".to_string(),
                technique: "Keep the elbows pinned to the sides and curl with control".to_string(),
                tips: vec!["Lower the weight slowly".to_string()],
                gif_url: None,
            },
            Exercise {
                id: "exercise_6".to_string(),
                name: "Plank".to_string(),
                muscle_group_id: "core".to_string(),
                category: "endurance".to_string(),
                difficulty: "easy".to_string(),
                description: "Static hold on forearms and toes".to_string(),
                technique: "Hold a straight line from head to heels".to_string(),
                tips: vec!["Do not let the hips sag".to_string()],
                gif_url: None,
            },
        ];

        let count = exercises.len();
        for exercise in exercises {
            self.store.insert_exercise(exercise).await?;
        }

        tracing::info!("Seeded {} exercises", count);
        Ok(())
    }
}
