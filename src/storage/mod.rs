//! Persistence behind a single `Store` handle.
//!
//! Backends are selected by configuration: in-memory collections, the same
//! collections mirrored to one JSON file each, or PostgreSQL. Booking
//! reservation and cancellation are conditional writes that each backend
//! performs atomically.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::models::{Booking, Exercise, MuscleGroup, Trainer, Training, User};

pub mod document;
pub mod postgres;

pub use document::DocumentStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record already exists: {0}")]
    Conflict(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt collection file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result of an attempt to take a seat in a training
#[derive(Debug, Clone, PartialEq)]
pub enum ReserveOutcome {
    Reserved(Booking),
    TrainingNotFound,
    AlreadyBooked,
    Full,
}

/// Result of an attempt to cancel a booking
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    Cancelled(Booking),
    NotFound,
    AlreadyCancelled,
}

/// Result of `Store::modify_user`
#[derive(Debug, Clone, PartialEq)]
pub enum UserUpdate {
    Applied(User),
    /// The change was declined; carries the record as stored
    Rejected(User),
    NotFound,
}

/// Storage handle shared by all services
#[derive(Debug, Clone)]
pub enum Store {
    Document(DocumentStore),
    Postgres(PgStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Store::Document($store) => $call,
            Store::Postgres($store) => $call,
        }
    };
}

impl Store {
    /// Open the backend named by `config`
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let store = match config.backend {
            StorageBackend::Memory => Store::Document(DocumentStore::in_memory()),
            StorageBackend::Json => Store::Document(DocumentStore::open(&config.data_dir).await?),
            StorageBackend::Postgres => {
                let pool = config.create_pool().await?;
                crate::config::run_migrations(&pool).await?;
                Store::Postgres(PgStore::new(pool))
            }
        };

        tracing::info!("Storage backend ready: {}", store.backend_name());
        Ok(store)
    }

    pub fn in_memory() -> Self {
        Store::Document(DocumentStore::in_memory())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Document(store) if store.is_persistent() => "json",
            Store::Document(_) => "memory",
            Store::Postgres(_) => "postgres",
        }
    }

    // Users

    /// Insert a user; fails with `Conflict` when the email is taken
    pub async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        dispatch!(self, s => s.insert_user(user).await)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        dispatch!(self, s => s.find_user_by_id(id).await)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        dispatch!(self, s => s.find_user_by_email(email).await)
    }

    pub async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        dispatch!(self, s => s.find_user_by_reset_token(token).await)
    }

    /// Read-modify-write of one user that no concurrent update can interleave
    /// with. `change` returns `false` to abandon the update.
    pub async fn modify_user<F>(&self, id: Uuid, change: F) -> Result<UserUpdate, StoreError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        dispatch!(self, s => s.modify_user(id, change).await)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        dispatch!(self, s => s.list_users().await)
    }

    // Catalog

    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, StoreError> {
        dispatch!(self, s => s.list_trainers().await)
    }

    pub async fn find_trainer(&self, id: &str) -> Result<Option<Trainer>, StoreError> {
        dispatch!(self, s => s.find_trainer(id).await)
    }

    pub async fn insert_trainer(&self, trainer: Trainer) -> Result<Trainer, StoreError> {
        dispatch!(self, s => s.insert_trainer(trainer).await)
    }

    pub async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, StoreError> {
        dispatch!(self, s => s.list_muscle_groups().await)
    }

    pub async fn insert_muscle_group(&self, group: MuscleGroup) -> Result<MuscleGroup, StoreError> {
        dispatch!(self, s => s.insert_muscle_group(group).await)
    }

    /// All exercises, or only those of one muscle group
    pub async fn list_exercises(&self, muscle_group_id: Option<&str>) -> Result<Vec<Exercise>, StoreError> {
        dispatch!(self, s => s.list_exercises(muscle_group_id).await)
    }

    pub async fn insert_exercise(&self, exercise: Exercise) -> Result<Exercise, StoreError> {
        dispatch!(self, s => s.insert_exercise(exercise).await)
    }

    pub async fn list_trainings(&self) -> Result<Vec<Training>, StoreError> {
        dispatch!(self, s => s.list_trainings().await)
    }

    pub async fn find_training(&self, id: &str) -> Result<Option<Training>, StoreError> {
        dispatch!(self, s => s.find_training(id).await)
    }

    pub async fn insert_training(&self, training: Training) -> Result<Training, StoreError> {
        dispatch!(self, s => s.insert_training(training).await)
    }

    // Bookings

    /// Insert `booking` unless the user already holds a seat for the same
    /// training and date, or the training is full on that date. The checks
    /// and the insert happen as one atomic step.
    pub async fn reserve_booking(&self, booking: Booking) -> Result<ReserveOutcome, StoreError> {
        dispatch!(self, s => s.reserve_booking(booking).await)
    }

    /// Mark a booking cancelled unless it already is, releasing its seat
    pub async fn cancel_booking(&self, id: Uuid, at: DateTime<Utc>) -> Result<CancelOutcome, StoreError> {
        dispatch!(self, s => s.cancel_booking(id, at).await)
    }

    pub async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        dispatch!(self, s => s.find_booking(id).await)
    }

    pub async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        dispatch!(self, s => s.list_bookings_for_user(user_id).await)
    }

    pub async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        dispatch!(self, s => s.list_bookings().await)
    }

    /// Number of non-cancelled bookings for a training on a date
    pub async fn count_active_bookings(&self, training_id: &str, date: NaiveDate) -> Result<usize, StoreError> {
        dispatch!(self, s => s.count_active_bookings(training_id, date).await)
    }

    /// Record count per collection
    pub async fn collection_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        dispatch!(self, s => s.collection_counts().await)
    }
}
