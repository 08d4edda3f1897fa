use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MuscleGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMuscleGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group_id: String,
    pub category: String,
    pub difficulty: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technique: String,
    #[serde(default)]
    pub tips: Vec<String>,
    pub gif_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateExercise {
    pub name: String,
    pub muscle_group_id: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technique: String,
    #[serde(default)]
    pub tips: Vec<String>,
    pub gif_url: Option<String>,
}

fn default_category() -> String {
    "strength".to_string()
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// Exercise joined with the name of its muscle group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseWithGroup {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub muscle_group: String,
}
