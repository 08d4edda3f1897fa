// Domain records and request/response shapes

pub mod booking;
pub mod exercise;
pub mod trainer;
pub mod training;
pub mod user;
pub mod validation;

pub use booking::*;
pub use exercise::*;
pub use trainer::*;
pub use training::*;
pub use user::*;
pub use validation::*;
