use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A recurring class or personal-training slot run by a trainer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Training {
    pub id: String,
    pub trainer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub capacity: i32,
    pub price: f64,
    /// Running count of bookings ever taken minus those cancelled
    #[serde(default)]
    pub current_bookings: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Training {
    /// Start of the session on `date`, in UTC
    pub fn starts_at(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(self.start_time).and_utc()
    }

    pub fn end_time(&self) -> NaiveTime {
        self.start_time + Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTraining {
    pub trainer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub capacity: i32,
    #[serde(default)]
    pub price: f64,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_difficulty() -> String {
    "beginner".to_string()
}

/// Training listing entry with trainer name and availability for one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingAvailability {
    #[serde(flatten)]
    pub training: Training,
    pub trainer_name: String,
    pub date: NaiveDate,
    pub available_spots: i32,
    pub is_fully_booked: bool,
}
