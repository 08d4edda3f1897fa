// HTTP-level tests driving the full router

mod admin_integration_test;
mod auth_integration_test;
mod booking_integration_test;
mod content_integration_test;
mod postgres_store_test;
