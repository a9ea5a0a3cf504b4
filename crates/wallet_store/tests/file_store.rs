use std::fs;

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::tempdir;
use wallet_domain::{
    card::{Card, CardType},
    cards::CardStore,
    custom::GlobalCustomReminder,
    storage::{KeyValueStore, CARDS_KEY, DISMISSALS_KEY},
};
use wallet_store::{build_wallet_service, FileStore, StoreConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn values_persist_across_reopen() {
    init_tracing();
    let temp = tempdir().expect("tempdir");

    let store = FileStore::open(temp.path()).expect("open store");
    assert_eq!(store.get("missing").expect("get"), None);
    store.set("app_preferences", "{\"reminderWindowDays\":9}").expect("set");
    store.set("odd key/with.dots", "x").expect("set odd key");
    drop(store);

    let reopened = FileStore::open(temp.path()).expect("reopen store");
    assert_eq!(
        reopened.get("app_preferences").expect("get").as_deref(),
        Some("{\"reminderWindowDays\":9}")
    );
    assert_eq!(
        reopened.keys().expect("keys"),
        vec!["app_preferences".to_string(), "odd key/with.dots".to_string()]
    );

    reopened.remove("app_preferences").expect("remove");
    reopened.remove("app_preferences").expect("removing twice is fine");
    assert_eq!(reopened.get("app_preferences").expect("get"), None);

    reopened.clear().expect("clear");
    assert!(reopened.keys().expect("keys").is_empty());
}

#[test]
fn writes_leave_no_staging_files() {
    init_tracing();
    let temp = tempdir().expect("tempdir");
    let store = FileStore::open(temp.path()).expect("open store");
    store.set(CARDS_KEY, "[]").expect("first write");
    store.set(CARDS_KEY, "[{\"id\":\"a\"}]").expect("overwrite");

    let names: Vec<String> = fs::read_dir(temp.path())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["cards_data.json".to_string()]);
}

#[test]
fn unreadable_entry_surfaces_as_storage_error() {
    init_tracing();
    let temp = tempdir().expect("tempdir");
    let store = FileStore::open(temp.path()).expect("open store");
    // A directory where a value file should be cannot be read as a string.
    fs::create_dir(temp.path().join(format!("{DISMISSALS_KEY}.json"))).expect("mkdir");
    assert!(store.get(DISMISSALS_KEY).is_err());
}

#[test]
fn wallet_service_runs_on_the_file_store() {
    init_tracing();
    let temp = tempdir().expect("tempdir");
    let config = StoreConfig {
        data_dir: temp.path().join("wallet"),
    };

    let mut card = Card::new("c1", CardType::Credit);
    card.bank_name = "Kotak".into();
    card.bill_generation_day = Some(15);
    CardStore::new(std::sync::Arc::new(config.open().expect("open")))
        .save(card)
        .expect("save card");

    let now = Utc.with_ymd_and_hms(2024, 7, 12, 9, 0, 0).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 7, 12).unwrap();
    let service = build_wallet_service(&config).expect("build service");
    service
        .set_global_custom_reminders(&[GlobalCustomReminder::new(14, "Pay society", "Maintenance", now)])
        .expect("save globals");

    let feed = service.load_feed(today, now).expect("feed");
    let labels: Vec<&str> = feed.reminders.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["Maintenance", "Statement coming up"]);

    service
        .dismiss_reminder_at(&feed.reminders[1].key, now)
        .expect("dismiss");

    // A fresh service over the same directory sees the dismissal.
    let service = build_wallet_service(&config).expect("rebuild service");
    let feed = service.load_feed(today, now).expect("feed");
    assert_eq!(feed.reminders.len(), 1);
    assert_eq!(feed.reminders[0].label, "Maintenance");

    let store = config.open().expect("open");
    assert_eq!(
        store.keys().expect("keys"),
        vec![
            "cards_data".to_string(),
            "global_custom_reminders".to_string(),
            "reminder_dismissals".to_string(),
        ]
    );
}
