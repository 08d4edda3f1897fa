// Environment-driven configuration and catalog seeding

pub mod app;
pub mod database;
pub mod seeding;

pub use app::AppConfig;
pub use database::{run_migrations, StorageBackend, StorageConfig};
pub use seeding::CatalogSeeder;
