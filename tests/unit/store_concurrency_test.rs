use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tokio::task::JoinSet;
use uuid::Uuid;

use fitstudio::config::{CatalogSeeder, StorageBackend, StorageConfig};
use fitstudio::models::Booking;
use fitstudio::storage::{ReserveOutcome, Store};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 6, 1).unwrap()
}

async fn seeded(store: Store) -> Store {
    CatalogSeeder::new(store.clone()).seed_all().await.unwrap();
    store
}

/// One parallel reservation per entry in `users`; returns how many got a seat
async fn race(store: &Store, training_id: &str, users: Vec<Uuid>) -> usize {
    let mut tasks = JoinSet::new();
    for user_id in users {
        let store = store.clone();
        let booking = Booking::new(user_id, training_id.to_string(), date());
        tasks.spawn(async move { store.reserve_booking(booking).await.unwrap() });
    }

    let mut reserved = 0;
    while let Some(outcome) = tasks.join_next().await {
        if matches!(outcome.unwrap(), ReserveOutcome::Reserved(_)) {
            reserved += 1;
        }
    }
    reserved
}

#[tokio::test]
async fn test_memory_store_caps_parallel_reservations() {
    let store = seeded(Store::in_memory()).await;
    let users = (0..25).map(|_| Uuid::new_v4()).collect();

    // training_2 seats 10
    assert_eq!(race(&store, "training_2", users).await, 10);
    assert_eq!(store.count_active_bookings("training_2", date()).await.unwrap(), 10);
}

#[tokio::test]
async fn test_memory_store_single_seat_per_user() {
    let store = seeded(Store::in_memory()).await;
    let user = Uuid::new_v4();

    assert_eq!(race(&store, "training_1", vec![user; 8]).await, 1);
}

#[tokio::test]
async fn test_json_store_caps_parallel_reservations_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        backend: StorageBackend::Json,
        data_dir: dir.path().to_path_buf(),
        ..StorageConfig::default()
    };

    let store = seeded(Store::connect(&config).await.unwrap()).await;
    assert_eq!(store.backend_name(), "json");

    let users = (0..15).map(|_| Uuid::new_v4()).collect();
    // training_4 seats 12
    assert_eq!(race(&store, "training_4", users).await, 12);
    drop(store);

    let reopened = Store::connect(&config).await.unwrap();
    assert_eq!(reopened.list_bookings().await.unwrap().len(), 12);
    assert_eq!(reopened.count_active_bookings("training_4", date()).await.unwrap(), 12);
    assert!(dir.path().join("bookings.json").exists());
}
