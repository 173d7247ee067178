/// Basic unit tests to verify core functionality through the public API
use chrono::{DateTime, Duration, TimeZone, Utc};
use habit_tracker_api::*;
use tempfile::TempDir;

async fn service() -> (TempDir, HabitService<SqliteStorage>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let images = ImageStore::init(ImageStoreConfig {
        root: dir.path().join("uploads"),
        max_bytes: 1024,
    })
    .await
    .expect("Failed to create image store");
    let storage = SqliteStorage::new(dir.path().join("habits.db")).expect("Failed to create storage");
    (dir, HabitService::new(storage, images, false))
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 27, 8, 0, 0).unwrap()
}

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let habit = Habit::new("Test Habit".to_string(), Some("A test habit".to_string()), false);

        assert!(habit.is_ok());
        let habit = habit.unwrap();
        assert_eq!(habit.name, "Test Habit");
        assert_eq!(habit.streak, 0);
    }

    #[test]
    fn test_mixed_operations_keep_one_upload_per_day() {
        let mut habit = Habit::new("Mixed".to_string(), None, false).unwrap();
        let mut now = start();

        for step in 0..30 {
            match step % 4 {
                0 | 1 => {
                    let _ = habit.record_upload(format!("/uploads/x/{step}.jpg"), now);
                }
                2 => {
                    let _ = habit.delete_today_upload(now);
                    let _ = habit.delete_today_upload(now);
                }
                _ => now = now + Duration::days(2),
            }
            now = now + Duration::hours(13);

            // Invariants that hold after every step
            let mut days: Vec<_> = habit.uploads.iter().map(Upload::calendar_day).collect();
            let total = days.len();
            days.dedup();
            assert_eq!(days.len(), total, "two uploads share a day");
        }
    }

    #[test]
    fn test_leap_day_counts_as_consecutive() {
        let mut habit = Habit::new("Leap".to_string(), None, false).unwrap();
        let feb_28 = Utc.with_ymd_and_hms(2024, 2, 28, 20, 0, 0).unwrap();

        habit.record_upload("/uploads/l/1.jpg".to_string(), feb_28).unwrap();
        habit.record_upload("/uploads/l/2.jpg".to_string(), feb_28 + Duration::days(1)).unwrap();
        habit.record_upload("/uploads/l/3.jpg".to_string(), feb_28 + Duration::days(2)).unwrap();

        assert_eq!(habit.streak, 3);
    }

    #[tokio::test]
    async fn test_service_round_trip() {
        let (_dir, service) = service().await;

        let created = service
            .create_habit(Some("Walk".to_string()), Some("Around the block".to_string()))
            .unwrap();
        let fetched = service.get_habit(&created.id).unwrap();

        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_service_streak_sequence() {
        let (_dir, service) = service().await;
        let habit = service.create_habit(Some("Walk".to_string()), None).unwrap();
        let day = start();

        let h = service.record_upload(&habit.id, Some("a.jpg"), b"a", day).await.unwrap();
        assert_eq!(h.streak, 1);
        let h = service
            .record_upload(&habit.id, Some("b.jpg"), b"b", day + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(h.streak, 2);
        let h = service
            .record_upload(&habit.id, Some("d.jpg"), b"d", day + Duration::days(3))
            .await
            .unwrap();
        assert_eq!(h.streak, 1);

        let rejected = service
            .record_upload(&habit.id, Some("e.jpg"), b"e", day + Duration::days(3))
            .await;
        assert!(matches!(
            rejected,
            Err(ServiceError::Domain(DomainError::DuplicateUpload { .. }))
        ));

        let stored = service.get_habit(&habit.id).unwrap();
        assert_eq!(stored.uploads.len(), 3);
        assert_eq!(stored.streak, 1);
    }

    #[tokio::test]
    async fn test_require_description_setting() {
        let dir = TempDir::new().unwrap();
        let images = ImageStore::init(ImageStoreConfig {
            root: dir.path().join("uploads"),
            max_bytes: 1024,
        })
        .await
        .unwrap();
        let service = HabitService::new(SqliteStorage::in_memory().unwrap(), images, true);

        let result = service.create_habit(Some("Walk".to_string()), None);
        assert!(matches!(result, Err(ServiceError::Domain(DomainError::Validation { .. }))));
        assert!(service.list_habits().unwrap().is_empty());
    }

    #[test]
    fn test_storage_creation() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = SqliteStorage::new(dir.path().join("habits.db"));
        assert!(storage.is_ok());
    }
}
