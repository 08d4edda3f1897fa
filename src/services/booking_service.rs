use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Booking, BookingDetails, BookingStats, CreateBookingRequest, Trainer, Training, User, UserRole,
};
use crate::storage::{CancelOutcome, ReserveOutcome, Store, StoreError};

/// Bookings can no longer be cancelled this close to the session start
pub const CANCELLATION_CUTOFF_HOURS: i64 = 2;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Cannot book a training for a past date")]
    PastDate,
    #[error("{0}")]
    Validation(String),
    #[error("Training not found")]
    TrainingNotFound,
    #[error("You have already booked this training for this date")]
    AlreadyBooked,
    #[error("No places left for this training on this date")]
    TrainingFull,
    #[error("Booking not found")]
    BookingNotFound,
    #[error("Booking is already cancelled")]
    AlreadyCancelled,
    #[error("Bookings can only be cancelled at least 2 hours before the training starts")]
    CancellationTooLate,
    #[error("You can only view your own bookings")]
    Forbidden,
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            BookingError::PastDate => (StatusCode::BAD_REQUEST, "Invalid date"),
            BookingError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            BookingError::TrainingNotFound => (StatusCode::NOT_FOUND, "Training not found"),
            BookingError::AlreadyBooked => (StatusCode::BAD_REQUEST, "Already booked"),
            BookingError::TrainingFull => (StatusCode::BAD_REQUEST, "Training full"),
            BookingError::BookingNotFound => (StatusCode::NOT_FOUND, "Booking not found"),
            BookingError::AlreadyCancelled => (StatusCode::BAD_REQUEST, "Already cancelled"),
            BookingError::CancellationTooLate => (StatusCode::BAD_REQUEST, "Cancellation too late"),
            BookingError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            BookingError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
        };

        let message = if status.is_server_error() {
            tracing::error!("Booking request failed: {}", self);
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

#[derive(Debug, Clone)]
pub struct BookingService {
    store: Store,
}

impl BookingService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, user: &User, request: CreateBookingRequest) -> Result<BookingDetails, BookingError> {
        self.create_at(user, request, Utc::now()).await
    }

    /// Book a seat; the duplicate and capacity checks run inside the
    /// store's atomic reservation
    pub async fn create_at(
        &self,
        user: &User,
        request: CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingDetails, BookingError> {
        let training_id = request.training_id.trim();
        if training_id.is_empty() {
            return Err(BookingError::Validation("training_id is required".to_string()));
        }
        if request.date < now.date_naive() {
            return Err(BookingError::PastDate);
        }

        let mut booking = Booking::new(user.id, training_id.to_string(), request.date);
        booking.created_at = now;
        booking.updated_at = now;

        let booking = match self.store.reserve_booking(booking).await? {
            ReserveOutcome::Reserved(booking) => booking,
            ReserveOutcome::TrainingNotFound => return Err(BookingError::TrainingNotFound),
            ReserveOutcome::AlreadyBooked => return Err(BookingError::AlreadyBooked),
            ReserveOutcome::Full => return Err(BookingError::TrainingFull),
        };

        tracing::info!(
            "User {} booked {} on {} ({})",
            user.id,
            booking.training_id,
            booking.date,
            booking.id
        );

        self.details(booking).await
    }

    pub async fn cancel(&self, user: &User, booking_id: Uuid) -> Result<BookingDetails, BookingError> {
        self.cancel_at(user, booking_id, Utc::now()).await
    }

    /// Cancel a booking owned by `user` (admins may cancel any booking)
    pub async fn cancel_at(
        &self,
        user: &User,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<BookingDetails, BookingError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .filter(|b| b.user_id == user.id || user.role == UserRole::Admin)
            .ok_or(BookingError::BookingNotFound)?;

        if !booking.status.is_active() {
            return Err(BookingError::AlreadyCancelled);
        }

        let starts_at = match self.store.find_training(&booking.training_id).await? {
            Some(training) => training.starts_at(booking.date),
            None => booking.date.and_time(NaiveTime::MIN).and_utc(),
        };
        if starts_at - now < Duration::hours(CANCELLATION_CUTOFF_HOURS) {
            return Err(BookingError::CancellationTooLate);
        }

        let cancelled = match self.store.cancel_booking(booking_id, now).await? {
            CancelOutcome::Cancelled(booking) => booking,
            CancelOutcome::NotFound => return Err(BookingError::BookingNotFound),
            CancelOutcome::AlreadyCancelled => return Err(BookingError::AlreadyCancelled),
        };

        tracing::info!("User {} cancelled booking {}", user.id, cancelled.id);
        self.details(cancelled).await
    }

    pub async fn list(&self, user_id: Uuid, upcoming: bool) -> Result<Vec<BookingDetails>, BookingError> {
        self.list_at(user_id, upcoming, Utc::now().date_naive()).await
    }

    /// A user's bookings, optionally only non-cancelled ones dated `today` or later
    pub async fn list_at(
        &self,
        user_id: Uuid,
        upcoming: bool,
        today: NaiveDate,
    ) -> Result<Vec<BookingDetails>, BookingError> {
        let bookings = self
            .store
            .list_bookings_for_user(user_id)
            .await?
            .into_iter()
            .filter(|b| !upcoming || (b.status.is_active() && b.date >= today))
            .collect();

        self.details_for(bookings).await
    }

    /// Bookings of `user_id` as seen by `requester`
    pub async fn list_for_user(
        &self,
        requester: &User,
        user_id: Uuid,
        upcoming: bool,
    ) -> Result<Vec<BookingDetails>, BookingError> {
        if requester.id != user_id && requester.role != UserRole::Admin {
            return Err(BookingError::Forbidden);
        }
        self.list(user_id, upcoming).await
    }

    pub async fn list_all(&self) -> Result<Vec<BookingDetails>, BookingError> {
        let bookings = self.store.list_bookings().await?;
        self.details_for(bookings).await
    }

    pub async fn stats(&self) -> Result<BookingStats, BookingError> {
        let bookings = self.store.list_bookings().await?;
        let trainings = self.store.list_trainings().await?;
        let titles: HashMap<&str, &str> = trainings.iter().map(|t| (t.id.as_str(), t.title.as_str())).collect();

        let mut popular_trainings = BTreeMap::new();
        let mut active_bookings = 0;
        for booking in bookings.iter().filter(|b| b.status.is_active()) {
            active_bookings += 1;
            let title = titles.get(booking.training_id.as_str()).copied().unwrap_or("Unknown");
            *popular_trainings.entry(title.to_string()).or_insert(0) += 1;
        }

        Ok(BookingStats {
            total_bookings: bookings.len(),
            active_bookings,
            cancelled_bookings: bookings.len() - active_bookings,
            total_trainings: trainings.len(),
            popular_trainings,
        })
    }

    async fn details(&self, booking: Booking) -> Result<BookingDetails, BookingError> {
        let training = self.store.find_training(&booking.training_id).await?;
        let trainer = match &training {
            Some(training) => self.store.find_trainer(&training.trainer_id).await?,
            None => None,
        };
        Ok(join(booking, training.as_ref(), trainer.as_ref()))
    }

    async fn details_for(&self, bookings: Vec<Booking>) -> Result<Vec<BookingDetails>, BookingError> {
        let trainings: HashMap<String, Training> = self
            .store
            .list_trainings()
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        let trainers: HashMap<String, Trainer> = self
            .store
            .list_trainers()
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let mut details: Vec<BookingDetails> = bookings
            .into_iter()
            .map(|booking| {
                let training = trainings.get(&booking.training_id);
                let trainer = training.and_then(|t| trainers.get(&t.trainer_id));
                join(booking, training, trainer)
            })
            .collect();

        details.sort_by(|a, b| {
            (a.booking.date, a.start_time, a.booking.created_at).cmp(&(b.booking.date, b.start_time, b.booking.created_at))
        });

        Ok(details)
    }
}

fn join(booking: Booking, training: Option<&Training>, trainer: Option<&Trainer>) -> BookingDetails {
    BookingDetails {
        title: training.map(|t| t.title.clone()).unwrap_or_else(|| "Unknown training".to_string()),
        start_time: training.map(|t| t.start_time),
        end_time: training.map(|t| t.end_time()),
        trainer_name: trainer.map(|t| t.name.clone()).unwrap_or_default(),
        price: training.map(|t| t.price).unwrap_or_default(),
        booking,
    }
}
