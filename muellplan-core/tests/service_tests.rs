use std::fs;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use muellplan_core::dataset::write_table;
use muellplan_core::{
    Clock, DatasetError, FixedClock, JsonScheduleStore, ScheduleService, ScheduleTable,
    SystemClock, WasteType, ZoneCode,
};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

fn zone(code: &str) -> ZoneCode {
    code.parse().unwrap()
}

fn sample_table() -> ScheduleTable {
    let mut table = ScheduleTable::default();
    let a1 = table.zone_mut(zone("A1"));
    a1.insert(date(3, 10), vec![WasteType::Residual]);
    a1.insert(date(3, 12), vec![WasteType::Organic, WasteType::Paper]);
    table.zone_mut(zone("B2"));
    table
}

#[test]
fn test_service_answers_from_in_memory_table() {
    let service = ScheduleService::with_clock(
        Arc::new(sample_table()),
        Arc::new(FixedClock(date(3, 11))),
    );

    let next = service.next_pickups(zone("A1")).unwrap();
    assert_eq!(next.reference_date, date(3, 11));
    assert_eq!(next.next_pickups[1].date, Some(date(3, 12)));

    let future = service.future_pickups(zone("A1")).unwrap();
    assert_eq!(future.zone, zone("A1"));
    assert_eq!(future.reference_date, date(3, 11));
    assert_eq!(future.schedule.len(), 1);
    assert_eq!(service.zones().unwrap(), vec![zone("A1"), zone("B2")]);
}

#[test]
fn test_unknown_zone_is_not_found() {
    let service = ScheduleService::with_clock(
        Arc::new(sample_table()),
        Arc::new(FixedClock(date(3, 11))),
    );

    let err = service.next_pickups(zone("C3")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_missing_dataset_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonScheduleStore::single(dir.path().join("waste-collection-2025.json"));
    let service = ScheduleService::with_clock(Arc::new(store), Arc::new(FixedClock(date(3, 11))));

    let err = service.next_pickups(zone("A1")).unwrap_err();
    assert!(matches!(err, DatasetError::Unavailable { .. }));
    assert!(!err.is_not_found());
}

#[test]
fn test_corrupted_dataset_is_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("waste-collection-2025.json");
    fs::write(&path, "{\"A\": {\"1\": [").unwrap();
    let store = JsonScheduleStore::single(&path);

    let err = store.table().unwrap_err();
    assert!(matches!(err, DatasetError::Corrupted { .. }));
}

#[test]
fn test_store_merges_years() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("waste-collection-2025.json");
    let second = dir.path().join("waste-collection-2026.json");
    write_table(&first, &sample_table()).unwrap();
    let mut next_year = ScheduleTable::default();
    next_year.zone_mut(zone("A1")).insert(
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        vec![WasteType::Packaging],
    );
    write_table(&second, &next_year).unwrap();

    let store = JsonScheduleStore::new(vec![first, second]);
    let service = ScheduleService::with_clock(
        Arc::new(store),
        Arc::new(FixedClock(NaiveDate::from_ymd_opt(2025, 12, 30).unwrap())),
    );

    let next = service.next_pickups(zone("A1")).unwrap();
    assert_eq!(
        next.next_pickups[3].date,
        NaiveDate::from_ymd_opt(2026, 1, 2)
    );
    assert_eq!(next.next_pickups[0].date, None);
}

#[test]
fn test_dataset_json_layout() {
    let json = serde_json::to_value(sample_table()).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "A": {"1": {
                "2025-03-10": ["Restmüll"],
                "2025-03-12": ["Biomüll", "Papiermüll"]
            }},
            "B": {"2": {}}
        })
    );
    let parsed: ScheduleTable = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, sample_table());
}

#[test]
fn test_future_schedule_json_shape() {
    let service = ScheduleService::with_clock(
        Arc::new(sample_table()),
        Arc::new(FixedClock(date(3, 11))),
    );

    let future = service.future_pickups_on(zone("A1"), date(3, 10)).unwrap();

    assert_eq!(
        serde_json::to_value(future).unwrap(),
        serde_json::json!({
            "zone": "A1",
            "reference_date": "2025-03-10",
            "schedule": [
                {"date": "2025-03-10", "waste_types": ["Restmüll"]},
                {"date": "2025-03-12", "waste_types": ["Biomüll", "Papiermüll"]}
            ]
        })
    );
}

#[test]
fn test_system_clock_reads_utc_day() {
    let before = Utc::now().date_naive();
    let today = SystemClock.today();
    let after = Utc::now().date_naive();

    assert!(before <= today && today <= after);
}
