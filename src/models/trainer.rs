use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trainer {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub experience_years: i32,
    pub rating: f64,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTrainer {
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub rating: f64,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub description: String,
}
