use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{
    validate_required, CreateExercise, CreateMuscleGroup, CreateTrainer, CreateTraining, Exercise, ExerciseWithGroup,
    MuscleGroup, Trainer, Training, TrainingAvailability,
};
use crate::storage::{Store, StoreError};

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for ContentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => ContentError::Conflict(what),
            other => ContentError::Storage(other),
        }
    }
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ContentError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            ContentError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            ContentError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ContentError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
        };

        let message = if status.is_server_error() {
            tracing::error!("Content request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Read access to the studio catalog plus admin creation
#[derive(Debug, Clone)]
pub struct ContentService {
    store: Store,
}

impl ContentService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, ContentError> {
        Ok(self.store.list_trainers().await?)
    }

    pub async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, ContentError> {
        Ok(self.store.list_muscle_groups().await?)
    }

    /// Exercises with their muscle group name, optionally for one group only
    pub async fn list_exercises(&self, muscle_group_id: Option<&str>) -> Result<Vec<ExerciseWithGroup>, ContentError> {
        let groups: HashMap<String, String> = self
            .store
            .list_muscle_groups()
            .await?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();

        let exercises = self.store.list_exercises(muscle_group_id).await?;

        Ok(exercises
            .into_iter()
            .map(|exercise| {
                let muscle_group = groups.get(&exercise.muscle_group_id).cloned().unwrap_or_default();
                ExerciseWithGroup { exercise, muscle_group }
            })
            .collect())
    }

    /// Active trainings with trainer names and free seats on `date`
    pub async fn list_trainings_on(&self, date: NaiveDate) -> Result<Vec<TrainingAvailability>, ContentError> {
        let trainers = self.trainer_names().await?;
        let trainings = self.store.list_trainings().await?;

        let mut listing = Vec::with_capacity(trainings.len());
        for training in trainings.into_iter().filter(|t| t.is_active) {
            listing.push(self.availability(training, date, &trainers).await?);
        }

        Ok(listing)
    }

    pub async fn get_training(&self, id: &str, date: NaiveDate) -> Result<TrainingAvailability, ContentError> {
        let training = self
            .store
            .find_training(id)
            .await?
            .filter(|t| t.is_active)
            .ok_or(ContentError::NotFound("Training"))?;

        let trainers = self.trainer_names().await?;
        self.availability(training, date, &trainers).await
    }

    pub async fn create_trainer(&self, request: CreateTrainer) -> Result<Trainer, ContentError> {
        validate_required(&request.name, "Name").map_err(validation)?;
        validate_required(&request.specialty, "Specialty").map_err(validation)?;
        if request.experience_years < 0 {
            return Err(ContentError::Validation("Experience cannot be negative".to_string()));
        }
        if !(0.0..=5.0).contains(&request.rating) {
            return Err(ContentError::Validation("Rating must be between 0 and 5".to_string()));
        }

        let existing: Vec<String> = self.store.list_trainers().await?.into_iter().map(|t| t.id).collect();
        let trainer = Trainer {
            id: next_id("trainer", &existing),
            name: request.name.trim().to_string(),
            specialty: request.specialty.trim().to_string(),
            experience_years: request.experience_years,
            rating: request.rating,
            photo_url: request.photo_url,
            description: request.description,
            created_at: Utc::now(),
        };

        let trainer = self.store.insert_trainer(trainer).await?;
        tracing::info!("Created trainer {}", trainer.id);
        Ok(trainer)
    }

    pub async fn create_muscle_group(&self, request: CreateMuscleGroup) -> Result<MuscleGroup, ContentError> {
        validate_required(&request.name, "Name").map_err(validation)?;

        let existing: Vec<String> = self.store.list_muscle_groups().await?.into_iter().map(|g| g.id).collect();
        let group = MuscleGroup {
            id: next_id("muscle_group", &existing),
            name: request.name.trim().to_string(),
            description: request.description,
        };

        let group = self.store.insert_muscle_group(group).await?;
        tracing::info!("Created muscle group {}", group.id);
        Ok(group)
    }

    pub async fn create_exercise(&self, request: CreateExercise) -> Result<Exercise, ContentError> {
        validate_required(&request.name, "Name").map_err(validation)?;
        let known_group = self
            .store
            .list_muscle_groups()
            .await?
            .iter()
            .any(|g| g.id == request.muscle_group_id);
        if !known_group {
            return Err(ContentError::Validation(format!(
                "Unknown muscle group '{}'",
                request.muscle_group_id
            )));
        }

        let existing: Vec<String> = self.store.list_exercises(None).await?.into_iter().map(|e| e.id).collect();
        let exercise = Exercise {
            id: next_id("exercise", &existing),
            name: request.name.trim().to_string(),
            muscle_group_id: request.muscle_group_id,
            category: request.category,
            difficulty: request.difficulty,
            description: request.description,
            technique: request.technique,
            tips: request.tips,
            gif_url: request.gif_url,
        };

        let exercise = self.store.insert_exercise(exercise).await?;
        tracing::info!("Created exercise {}", exercise.id);
        Ok(exercise)
    }

    pub async fn create_training(&self, request: CreateTraining) -> Result<Training, ContentError> {
        validate_required(&request.title, "Title").map_err(validation)?;
        if request.duration_minutes <= 0 {
            return Err(ContentError::Validation("Duration must be positive".to_string()));
        }
        if request.capacity <= 0 {
            return Err(ContentError::Validation("Capacity must be positive".to_string()));
        }
        if request.price < 0.0 {
            return Err(ContentError::Validation("Price cannot be negative".to_string()));
        }
        if self.store.find_trainer(&request.trainer_id).await?.is_none() {
            return Err(ContentError::Validation(format!("Unknown trainer '{}'", request.trainer_id)));
        }

        let existing: Vec<String> = self.store.list_trainings().await?.into_iter().map(|t| t.id).collect();
        let now = Utc::now();
        let training = Training {
            id: next_id("training", &existing),
            trainer_id: request.trainer_id,
            title: request.title.trim().to_string(),
            description: request.description,
            category: request.category,
            difficulty: request.difficulty,
            start_time: request.start_time,
            duration_minutes: request.duration_minutes,
            capacity: request.capacity,
            price: request.price,
            current_bookings: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let training = self.store.insert_training(training).await?;
        tracing::info!("Created training {}", training.id);
        Ok(training)
    }

    async fn trainer_names(&self) -> Result<HashMap<String, String>, ContentError> {
        Ok(self
            .store
            .list_trainers()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect())
    }

    async fn availability(
        &self,
        training: Training,
        date: NaiveDate,
        trainers: &HashMap<String, String>,
    ) -> Result<TrainingAvailability, ContentError> {
        let taken = self.store.count_active_bookings(&training.id, date).await?;
        let available_spots = (training.capacity as i64 - taken as i64).max(0) as i32;

        Ok(TrainingAvailability {
            trainer_name: trainers.get(&training.trainer_id).cloned().unwrap_or_default(),
            date,
            available_spots,
            is_fully_booked: available_spots == 0,
            training,
        })
    }
}

fn validation(err: anyhow::Error) -> ContentError {
    ContentError::Validation(err.to_string())
}

/// Next free `<kind>_<n>` id, one past the highest numeric suffix in use
fn next_id(kind: &str, existing: &[String]) -> String {
    let prefix = format!("{}_", kind);
    let highest = existing
        .iter()
        .filter_map(|id| id.strip_prefix(&prefix))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    format!("{}{}", prefix, highest + 1)
}
