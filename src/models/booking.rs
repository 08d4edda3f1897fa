use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            // older JSON data used "active" for confirmed bookings
            "confirmed" | "active" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Every status except `cancelled` holds a seat
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub training_id: String,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, training_id: String, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            training_id,
            date,
            status: BookingStatus::Confirmed,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when this booking occupies a seat of `training_id` on `date`
    pub fn holds_seat(&self, training_id: &str, date: NaiveDate) -> bool {
        self.status.is_active() && self.training_id == training_id && self.date == date
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub training_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    #[serde(default)]
    pub upcoming: bool,
}

/// Booking joined with the training and trainer it refers to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub title: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub trainer_name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingStats {
    pub total_bookings: usize,
    pub active_bookings: usize,
    pub cancelled_bookings: usize,
    pub total_trainings: usize,
    pub popular_trainings: std::collections::BTreeMap<String, usize>,
}
