use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CancelOutcome, ReserveOutcome, StoreError, UserUpdate};
use crate::models::{normalize_email, Booking, BookingStatus, Exercise, MuscleGroup, Trainer, Training, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Users,
    Trainers,
    Trainings,
    Bookings,
    Exercises,
    MuscleGroups,
}

impl Collection {
    const ALL: [Collection; 6] = [
        Collection::Users,
        Collection::Trainers,
        Collection::Trainings,
        Collection::Bookings,
        Collection::Exercises,
        Collection::MuscleGroups,
    ];

    fn file_name(self) -> &'static str {
        match self {
            Collection::Users => "users.json",
            Collection::Trainers => "trainers.json",
            Collection::Trainings => "trainings.json",
            Collection::Bookings => "bookings.json",
            Collection::Exercises => "exercises.json",
            Collection::MuscleGroups => "muscle_groups.json",
        }
    }

    fn name(self) -> &'static str {
        self.file_name().trim_end_matches(".json")
    }
}

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    trainers: Vec<Trainer>,
    trainings: Vec<Training>,
    bookings: Vec<Booking>,
    exercises: Vec<Exercise>,
    muscle_groups: Vec<MuscleGroup>,
}

/// Collections held in memory behind one lock, optionally mirrored to a
/// directory of pretty-printed JSON arrays (one file per collection).
///
/// Every mutation builds the new collection, writes it to disk, and only
/// then swaps it into memory, all while holding the lock.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    data: Arc<Mutex<Collections>>,
    data_dir: Option<PathBuf>,
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self {
            data: Arc::new(Mutex::new(Collections::default())),
            data_dir: None,
        }
    }

    /// Load every collection file under `dir`, creating missing ones as `[]`
    pub async fn open(dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir).await.map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let collections = Collections {
            users: load(dir, Collection::Users).await?,
            trainers: load(dir, Collection::Trainers).await?,
            trainings: load(dir, Collection::Trainings).await?,
            bookings: load(dir, Collection::Bookings).await?,
            exercises: load(dir, Collection::Exercises).await?,
            muscle_groups: load(dir, Collection::MuscleGroups).await?,
        };

        tracing::info!(
            "Opened JSON store at {} ({} users, {} bookings)",
            dir.display(),
            collections.users.len(),
            collections.bookings.len()
        );

        Ok(Self {
            data: Arc::new(Mutex::new(collections)),
            data_dir: Some(dir.to_path_buf()),
        })
    }

    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some()
    }

    async fn write<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<(), StoreError> {
        let Some(dir) = &self.data_dir else {
            return Ok(());
        };

        let path = dir.join(collection.file_name());
        let tmp = dir.join(format!("{}.tmp", collection.file_name()));
        let json = serde_json::to_vec_pretty(records)?;

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io { path, source })?;

        Ok(())
    }

    /// Bookings and trainings change together; if the trainings file cannot
    /// be written the previous bookings file is put back.
    async fn write_booking_change(
        &self,
        previous: &[Booking],
        bookings: &[Booking],
        trainings: &[Training],
    ) -> Result<(), StoreError> {
        self.write(Collection::Bookings, bookings).await?;

        if let Err(err) = self.write(Collection::Trainings, trainings).await {
            if let Err(restore_err) = self.write(Collection::Bookings, previous).await {
                tracing::error!("Failed to restore bookings after a trainings write error: {}", restore_err);
            }
            return Err(err);
        }

        Ok(())
    }

    // Users

    pub async fn insert_user(&self, mut user: User) -> Result<User, StoreError> {
        user.email = normalize_email(&user.email);

        let mut data = self.data.lock().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("user with email {}", user.email)));
        }

        let mut users = data.users.clone();
        users.push(user.clone());
        self.write(Collection::Users, &users).await?;
        data.users = users;

        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let data = self.data.lock().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    pub async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    /// Applies `change` to a copy of the user under the lock; a `false`
    /// return leaves the stored record untouched.
    pub async fn modify_user<F>(&self, id: Uuid, change: F) -> Result<UserUpdate, StoreError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let mut data = self.data.lock().await;
        let Some(index) = data.users.iter().position(|u| u.id == id) else {
            return Ok(UserUpdate::NotFound);
        };

        let mut user = data.users[index].clone();
        if !change(&mut user) {
            return Ok(UserUpdate::Rejected(data.users[index].clone()));
        }

        let mut users = data.users.clone();
        users[index] = user.clone();
        self.write(Collection::Users, &users).await?;
        data.users = users;

        Ok(UserUpdate::Applied(user))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.data.lock().await.users.clone())
    }

    // Catalog

    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, StoreError> {
        Ok(self.data.lock().await.trainers.clone())
    }

    pub async fn find_trainer(&self, id: &str) -> Result<Option<Trainer>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.trainers.iter().find(|t| t.id == id).cloned())
    }

    pub async fn insert_trainer(&self, trainer: Trainer) -> Result<Trainer, StoreError> {
        let mut data = self.data.lock().await;
        if data.trainers.iter().any(|t| t.id == trainer.id) {
            return Err(StoreError::Conflict(format!("trainer {}", trainer.id)));
        }

        let mut trainers = data.trainers.clone();
        trainers.push(trainer.clone());
        self.write(Collection::Trainers, &trainers).await?;
        data.trainers = trainers;

        Ok(trainer)
    }

    pub async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, StoreError> {
        Ok(self.data.lock().await.muscle_groups.clone())
    }

    pub async fn insert_muscle_group(&self, group: MuscleGroup) -> Result<MuscleGroup, StoreError> {
        let mut data = self.data.lock().await;
        if data.muscle_groups.iter().any(|g| g.id == group.id) {
            return Err(StoreError::Conflict(format!("muscle group {}", group.id)));
        }

        let mut groups = data.muscle_groups.clone();
        groups.push(group.clone());
        self.write(Collection::MuscleGroups, &groups).await?;
        data.muscle_groups = groups;

        Ok(group)
    }

    pub async fn list_exercises(&self, muscle_group_id: Option<&str>) -> Result<Vec<Exercise>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .exercises
            .iter()
            .filter(|e| muscle_group_id.map_or(true, |id| e.muscle_group_id == id))
            .cloned()
            .collect())
    }

    pub async fn insert_exercise(&self, exercise: Exercise) -> Result<Exercise, StoreError> {
        let mut data = self.data.lock().await;
        if data.exercises.iter().any(|e| e.id == exercise.id) {
            return Err(StoreError::Conflict(format!("exercise {}", exercise.id)));
        }

        let mut exercises = data.exercises.clone();
        exercises.push(exercise.clone());
        self.write(Collection::Exercises, &exercises).await?;
        data.exercises = exercises;

        Ok(exercise)
    }

    pub async fn list_trainings(&self) -> Result<Vec<Training>, StoreError> {
        Ok(self.data.lock().await.trainings.clone())
    }

    pub async fn find_training(&self, id: &str) -> Result<Option<Training>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.trainings.iter().find(|t| t.id == id).cloned())
    }

    pub async fn insert_training(&self, training: Training) -> Result<Training, StoreError> {
        let mut data = self.data.lock().await;
        if data.trainings.iter().any(|t| t.id == training.id) {
            return Err(StoreError::Conflict(format!("training {}", training.id)));
        }

        let mut trainings = data.trainings.clone();
        trainings.push(training.clone());
        self.write(Collection::Trainings, &trainings).await?;
        data.trainings = trainings;

        Ok(training)
    }

    // Bookings

    pub async fn reserve_booking(&self, booking: Booking) -> Result<ReserveOutcome, StoreError> {
        let mut data = self.data.lock().await;

        let Some(training_index) = data
            .trainings
            .iter()
            .position(|t| t.id == booking.training_id && t.is_active)
        else {
            return Ok(ReserveOutcome::TrainingNotFound);
        };

        let mut seats_taken = 0usize;
        for held in data.bookings.iter().filter(|b| b.holds_seat(&booking.training_id, booking.date)) {
            if held.user_id == booking.user_id {
                return Ok(ReserveOutcome::AlreadyBooked);
            }
            seats_taken += 1;
        }

        let capacity = data.trainings[training_index].capacity.max(0) as usize;
        if seats_taken >= capacity {
            return Ok(ReserveOutcome::Full);
        }

        let mut bookings = data.bookings.clone();
        bookings.push(booking.clone());

        let mut trainings = data.trainings.clone();
        let training = &mut trainings[training_index];
        training.current_bookings += 1;
        training.updated_at = booking.created_at;

        self.write_booking_change(&data.bookings, &bookings, &trainings).await?;
        data.bookings = bookings;
        data.trainings = trainings;

        Ok(ReserveOutcome::Reserved(booking))
    }

    pub async fn cancel_booking(&self, id: Uuid, at: DateTime<Utc>) -> Result<CancelOutcome, StoreError> {
        let mut data = self.data.lock().await;

        let Some(index) = data.bookings.iter().position(|b| b.id == id) else {
            return Ok(CancelOutcome::NotFound);
        };
        if data.bookings[index].status == BookingStatus::Cancelled {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let mut bookings = data.bookings.clone();
        let booking = &mut bookings[index];
        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(at);
        booking.updated_at = at;
        let cancelled = booking.clone();

        let mut trainings = data.trainings.clone();
        if let Some(training) = trainings.iter_mut().find(|t| t.id == cancelled.training_id) {
            if training.current_bookings > 0 {
                training.current_bookings -= 1;
                training.updated_at = at;
            }
        }

        self.write_booking_change(&data.bookings, &bookings, &trainings).await?;
        data.bookings = bookings;
        data.trainings = trainings;

        Ok(CancelOutcome::Cancelled(cancelled))
    }

    pub async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.bookings.iter().find(|b| b.id == id).cloned())
    }

    pub async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    pub async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        Ok(self.data.lock().await.bookings.clone())
    }

    pub async fn count_active_bookings(&self, training_id: &str, date: NaiveDate) -> Result<usize, StoreError> {
        let data = self.data.lock().await;
        Ok(data.bookings.iter().filter(|b| b.holds_seat(training_id, date)).count())
    }

    pub async fn collection_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let data = self.data.lock().await;
        Ok(Collection::ALL
            .iter()
            .map(|&c| {
                let count = match c {
                    Collection::Users => data.users.len(),
                    Collection::Trainers => data.trainers.len(),
                    Collection::Trainings => data.trainings.len(),
                    Collection::Bookings => data.bookings.len(),
                    Collection::Exercises => data.exercises.len(),
                    Collection::MuscleGroups => data.muscle_groups.len(),
                };
                (c.name().to_string(), count)
            })
            .collect())
    }
}

/// Read one collection file; a missing file is created empty, an unreadable
/// or malformed one is an error rather than an empty collection
async fn load<T: DeserializeOwned>(dir: &Path, collection: Collection) -> Result<Vec<T>, StoreError> {
    let path = dir.join(collection.file_name());

    match tokio::fs::read(&path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { path, source }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::write(&path, b"[]")
                .await
                .map_err(|source| StoreError::Io { path: path.clone(), source })?;
            tracing::info!("Created empty collection file {}", path.display());
            Ok(Vec::new())
        }
        Err(source) => Err(StoreError::Io { path, source }),
    }
}
