use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{CancelOutcome, ReserveOutcome, StoreError, UserUpdate};
use crate::models::{
    normalize_email, Booking, BookingStatus, Exercise, MuscleGroup, Trainer, Training, User, UserRole,
};

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role, is_active, last_login, \
     reset_token, reset_token_expires_at, created_at, updated_at";

const TRAINING_COLUMNS: &str = "id, trainer_id, title, description, category, difficulty, start_time, \
     duration_minutes, capacity, price, current_bookings, is_active, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, user_id, training_id, date, status, cancelled_at, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    reset_token: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role: UserRole::parse(&row.role).unwrap_or_default(),
            is_active: row.is_active,
            last_login: row.last_login,
            reset_token: row.reset_token,
            reset_token_expires_at: row.reset_token_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TrainerRow {
    id: String,
    name: String,
    specialty: String,
    experience_years: i32,
    rating: f64,
    photo_url: Option<String>,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<TrainerRow> for Trainer {
    fn from(row: TrainerRow) -> Self {
        Trainer {
            id: row.id,
            name: row.name,
            specialty: row.specialty,
            experience_years: row.experience_years,
            rating: row.rating,
            photo_url: row.photo_url,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MuscleGroupRow {
    id: String,
    name: String,
    description: String,
}

#[derive(Debug, FromRow)]
struct ExerciseRow {
    id: String,
    name: String,
    muscle_group_id: String,
    category: String,
    difficulty: String,
    description: String,
    technique: String,
    tips: Vec<String>,
    gif_url: Option<String>,
}

impl From<ExerciseRow> for Exercise {
    fn from(row: ExerciseRow) -> Self {
        Exercise {
            id: row.id,
            name: row.name,
            muscle_group_id: row.muscle_group_id,
            category: row.category,
            difficulty: row.difficulty,
            description: row.description,
            technique: row.technique,
            tips: row.tips,
            gif_url: row.gif_url,
        }
    }
}

#[derive(Debug, FromRow)]
struct TrainingRow {
    id: String,
    trainer_id: String,
    title: String,
    description: String,
    category: String,
    difficulty: String,
    start_time: NaiveTime,
    duration_minutes: i32,
    capacity: i32,
    price: f64,
    current_bookings: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TrainingRow> for Training {
    fn from(row: TrainingRow) -> Self {
        Training {
            id: row.id,
            trainer_id: row.trainer_id,
            title: row.title,
            description: row.description,
            category: row.category,
            difficulty: row.difficulty,
            start_time: row.start_time,
            duration_minutes: row.duration_minutes,
            capacity: row.capacity,
            price: row.price,
            current_bookings: row.current_bookings,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    training_id: String,
    date: NaiveDate,
    status: String,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            user_id: row.user_id,
            training_id: row.training_id,
            date: row.date,
            // the status column carries a CHECK constraint
            status: BookingStatus::parse(&row.status).unwrap_or(BookingStatus::Pending),
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn conflict_or(err: sqlx::Error, what: impl Into<String>) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict(what.into()),
        _ => StoreError::Database(err),
    }
}

/// PostgreSQL backend; see `migrations/` for the schema
#[derive(Debug, Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // Users

    pub async fn insert_user(&self, mut user: User) -> Result<User, StoreError> {
        user.email = normalize_email(&user.email);

        sqlx::query(
            "INSERT INTO users (id, name, email, phone, password_hash, role, is_active, last_login,
                                reset_token, reset_token_expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.last_login)
        .bind(&user.reset_token)
        .bind(user.reset_token_expires_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| conflict_or(e, format!("user with email {}", user.email)))?;

        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(User::from))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(User::from))
    }

    /// Applies `change` to the row while holding its lock; a `false` return
    /// rolls back without writing.
    pub async fn modify_user<F>(&self, id: Uuid, change: F) -> Result<UserUpdate, StoreError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(UserUpdate::NotFound);
        };

        let current = User::from(row);
        let mut user = current.clone();
        if !change(&mut user) {
            return Ok(UserUpdate::Rejected(current));
        }

        sqlx::query(
            "UPDATE users
             SET name = $2, phone = $3, password_hash = $4, role = $5, is_active = $6,
                 last_login = $7, reset_token = $8, reset_token_expires_at = $9, updated_at = $10
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.last_login)
        .bind(&user.reset_token)
        .bind(user.reset_token_expires_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UserUpdate::Applied(user))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    // Catalog

    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, StoreError> {
        let rows = sqlx::query_as::<_, TrainerRow>(
            "SELECT id, name, specialty, experience_years, rating, photo_url, description, created_at
             FROM trainers ORDER BY created_at, id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Trainer::from).collect())
    }

    pub async fn find_trainer(&self, id: &str) -> Result<Option<Trainer>, StoreError> {
        let row = sqlx::query_as::<_, TrainerRow>(
            "SELECT id, name, specialty, experience_years, rating, photo_url, description, created_at
             FROM trainers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Trainer::from))
    }

    pub async fn insert_trainer(&self, trainer: Trainer) -> Result<Trainer, StoreError> {
        sqlx::query(
            "INSERT INTO trainers (id, name, specialty, experience_years, rating, photo_url, description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&trainer.id)
        .bind(&trainer.name)
        .bind(&trainer.specialty)
        .bind(trainer.experience_years)
        .bind(trainer.rating)
        .bind(&trainer.photo_url)
        .bind(&trainer.description)
        .bind(trainer.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| conflict_or(e, format!("trainer {}", trainer.id)))?;

        Ok(trainer)
    }

    pub async fn list_muscle_groups(&self) -> Result<Vec<MuscleGroup>, StoreError> {
        let rows = sqlx::query_as::<_, MuscleGroupRow>("SELECT id, name, description FROM muscle_groups ORDER BY id")
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| MuscleGroup {
                id: row.id,
                name: row.name,
                description: row.description,
            })
            .collect())
    }

    pub async fn insert_muscle_group(&self, group: MuscleGroup) -> Result<MuscleGroup, StoreError> {
        sqlx::query("INSERT INTO muscle_groups (id, name, description) VALUES ($1, $2, $3)")
            .bind(&group.id)
            .bind(&group.name)
            .bind(&group.description)
            .execute(&self.db)
            .await
            .map_err(|e| conflict_or(e, format!("muscle group {}", group.id)))?;

        Ok(group)
    }

    pub async fn list_exercises(&self, muscle_group_id: Option<&str>) -> Result<Vec<Exercise>, StoreError> {
        let rows = sqlx::query_as::<_, ExerciseRow>(
            "SELECT id, name, muscle_group_id, category, difficulty, description, technique, tips, gif_url
             FROM exercises
             WHERE $1::TEXT IS NULL OR muscle_group_id = $1
             ORDER BY id",
        )
        .bind(muscle_group_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Exercise::from).collect())
    }

    pub async fn insert_exercise(&self, exercise: Exercise) -> Result<Exercise, StoreError> {
        sqlx::query(
            "INSERT INTO exercises (id, name, muscle_group_id, category, difficulty, description, technique, tips, gif_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&exercise.id)
        .bind(&exercise.name)
        .bind(&exercise.muscle_group_id)
        .bind(&exercise.category)
        .bind(&exercise.difficulty)
        .bind(&exercise.description)
        .bind(&exercise.technique)
        .bind(&exercise.tips)
        .bind(&exercise.gif_url)
        .execute(&self.db)
        .await
        .map_err(|e| conflict_or(e, format!("exercise {}", exercise.id)))?;

        Ok(exercise)
    }

    pub async fn list_trainings(&self) -> Result<Vec<Training>, StoreError> {
        let rows = sqlx::query_as::<_, TrainingRow>(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings ORDER BY created_at, id"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Training::from).collect())
    }

    pub async fn find_training(&self, id: &str) -> Result<Option<Training>, StoreError> {
        let row = sqlx::query_as::<_, TrainingRow>(&format!("SELECT {TRAINING_COLUMNS} FROM trainings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Training::from))
    }

    pub async fn insert_training(&self, training: Training) -> Result<Training, StoreError> {
        sqlx::query(&format!(
            "INSERT INTO trainings ({TRAINING_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(&training.id)
        .bind(&training.trainer_id)
        .bind(&training.title)
        .bind(&training.description)
        .bind(&training.category)
        .bind(&training.difficulty)
        .bind(training.start_time)
        .bind(training.duration_minutes)
        .bind(training.capacity)
        .bind(training.price)
        .bind(training.current_bookings)
        .bind(training.is_active)
        .bind(training.created_at)
        .bind(training.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| conflict_or(e, format!("training {}", training.id)))?;

        Ok(training)
    }

    // Bookings

    /// Locks the training row so concurrent reservations for it serialize;
    /// the partial unique index on active bookings backs the duplicate check.
    pub async fn reserve_booking(&self, booking: Booking) -> Result<ReserveOutcome, StoreError> {
        let mut tx = self.db.begin().await?;

        let capacity: Option<i32> =
            sqlx::query_scalar("SELECT capacity FROM trainings WHERE id = $1 AND is_active FOR UPDATE")
                .bind(&booking.training_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(capacity) = capacity else {
            return Ok(ReserveOutcome::TrainingNotFound);
        };

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM bookings
                 WHERE user_id = $1 AND training_id = $2 AND date = $3 AND status <> 'cancelled'
             )",
        )
        .bind(booking.user_id)
        .bind(&booking.training_id)
        .bind(booking.date)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Ok(ReserveOutcome::AlreadyBooked);
        }

        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE training_id = $1 AND date = $2 AND status <> 'cancelled'",
        )
        .bind(&booking.training_id)
        .bind(booking.date)
        .fetch_one(&mut *tx)
        .await?;

        if taken >= i64::from(capacity) {
            return Ok(ReserveOutcome::Full);
        }

        let inserted = sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(&booking.training_id)
        .bind(booking.date)
        .bind(booking.status.as_str())
        .bind(booking.cancelled_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            return match conflict_or(err, "booking") {
                StoreError::Conflict(_) => Ok(ReserveOutcome::AlreadyBooked),
                other => Err(other),
            };
        }

        sqlx::query("UPDATE trainings SET current_bookings = current_bookings + 1, updated_at = $2 WHERE id = $1")
            .bind(&booking.training_id)
            .bind(booking.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ReserveOutcome::Reserved(booking))
    }

    pub async fn cancel_booking(&self, id: Uuid, at: DateTime<Utc>) -> Result<CancelOutcome, StoreError> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(CancelOutcome::NotFound);
        };
        if row.status == BookingStatus::Cancelled.as_str() {
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let updated = sqlx::query_as::<_, BookingRow>(&format!(
            "UPDATE bookings SET status = 'cancelled', cancelled_at = $2, updated_at = $2
             WHERE id = $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE trainings SET current_bookings = GREATEST(current_bookings - 1, 0), updated_at = $2
             WHERE id = $1",
        )
        .bind(&updated.training_id)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(CancelOutcome::Cancelled(updated.into()))
    }

    pub async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(Booking::from))
    }

    pub async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY date, created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    pub async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY date, created_at"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    pub async fn count_active_bookings(&self, training_id: &str, date: NaiveDate) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE training_id = $1 AND date = $2 AND status <> 'cancelled'",
        )
        .bind(training_id)
        .bind(date)
        .fetch_one(&self.db)
        .await?;

        Ok(count as usize)
    }

    pub async fn collection_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let mut counts = BTreeMap::new();
        for table in ["users", "trainers", "trainings", "bookings", "exercises", "muscle_groups"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&self.db)
                .await?;
            counts.insert(table.to_string(), count as usize);
        }

        Ok(counts)
    }
}
