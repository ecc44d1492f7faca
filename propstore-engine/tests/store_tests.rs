mod common;

use common::*;
use pretty_assertions::assert_eq;
use propstore_engine::{
    CollectionAction, CollectionChange, CommitMode, MemoryAccessor, PhysicalAccessor, PropertyStore,
    StoreConfig, StoreError, StoreEvent,
};
use propstore_model::PropertyDescriptor;
use propstore_types::{PropertyType, PropertyValue};
use std::sync::Arc;

fn changing(name: &str) -> StoreEvent {
    StoreEvent::Changing(name.to_string())
}

fn changed(name: &str) -> StoreEvent {
    StoreEvent::Changed(name.to_string())
}

// ── Immediate mode ───────────────────────────────────────────────

#[test]
fn immediate_set_reaches_host() {
    let (store, host) = store(CommitMode::Immediate);
    store.set("MaxValue", 10).unwrap();

    assert_eq!(host.value("MaxValue"), Some(PropertyValue::Int32(10)));
    assert_eq!(store.try_get("MaxValue").unwrap(), Some(PropertyValue::Int32(10)));
    assert!(!store.is_dirty());
    assert!(store.dirty_names().is_empty());
}

#[test]
fn immediate_get_reads_host_not_cache() {
    let (store, host) = store(CommitMode::Immediate);
    store.set("MinValue", 5).unwrap();
    host.set("MinValue", &PropertyValue::Int32(7)).unwrap();
    assert_eq!(store.get_as::<i32>("MinValue").unwrap(), Some(7));
}

#[test]
fn immediate_accessor_failure_propagates_and_keeps_cache() {
    let host = Arc::new(FailingAccessor::new(&["MaxValue"]));
    let store = PropertyStore::new(descriptors(), Arc::clone(&host), CommitMode::Immediate);

    let err = store.set("MaxValue", 10).unwrap_err();
    assert!(matches!(err, StoreError::Accessor { ref name, .. } if name == "MaxValue"));
    assert!(err.to_string().contains("host rejected MaxValue"));
    assert_eq!(
        store.cached_values().get("MaxValue"),
        Some(&PropertyValue::Int32(10))
    );
    assert_eq!(host.inner.value("MaxValue"), Some(PropertyValue::Int32(i32::MAX)));
}

// ── Staged mode ──────────────────────────────────────────────────

#[test]
fn staged_set_stays_local_until_commit() {
    let (store, host) = store(CommitMode::Staged);
    store.set("MaxValue", 10).unwrap();

    assert_eq!(store.try_get("MaxValue").unwrap(), Some(PropertyValue::Int32(10)));
    assert_eq!(host.value("MaxValue"), Some(PropertyValue::Int32(i32::MAX)));
    assert!(store.is_dirty());
    assert!(store.is_name_dirty("MaxValue"));
    assert!(!store.is_name_dirty("MinValue"));

    store.commit().unwrap();
    assert_eq!(host.value("MaxValue"), Some(PropertyValue::Int32(10)));
    assert!(!store.is_dirty());
    assert_eq!(store.try_get("MaxValue").unwrap(), Some(PropertyValue::Int32(10)));
}

#[test]
fn staged_dirty_names_are_ordered() {
    let (store, _host) = store(CommitMode::Staged);
    store.set("MinValue", 1).unwrap();
    store.set("CurrentDirectory", "/tmp").unwrap();
    store.set("MaxValue", 2).unwrap();
    assert_eq!(
        store.dirty_names(),
        vec!["CurrentDirectory", "MaxValue", "MinValue"]
    );
    assert_eq!(store.keys(), store.dirty_names());
    assert_eq!(store.len(), 3);
}

#[test]
fn commit_with_nothing_dirty_is_noop() {
    let (store, host) = store(CommitMode::Staged);
    let before = host.values();
    store.commit().unwrap();
    assert_eq!(host.values(), before);
}

#[test]
fn partial_commit_failure_leaves_later_names_dirty() {
    let host = Arc::new(FailingAccessor::new(&["MaxValue"]));
    let store = PropertyStore::new(descriptors(), Arc::clone(&host), CommitMode::Staged);
    store.set("CurrentDirectory", "/tmp").unwrap();
    store.set("MaxValue", 10).unwrap();
    store.set("MinValue", 1).unwrap();

    let err = store.commit().unwrap_err();
    assert!(matches!(err, StoreError::Accessor { ref name, .. } if name == "MaxValue"));
    assert_eq!(host.inner.value("CurrentDirectory"), Some("/tmp".into()));
    assert_eq!(store.dirty_names(), vec!["MaxValue", "MinValue"]);
    assert_eq!(host.inner.value("MinValue"), Some(PropertyValue::Int32(0)));

    host.heal();
    store.commit().unwrap();
    assert!(!store.is_dirty());
    assert_eq!(host.inner.value("MinValue"), Some(PropertyValue::Int32(1)));
}

// ── set semantics ────────────────────────────────────────────────

#[test]
fn set_equal_value_is_silent_noop() {
    let (store, _host) = store(CommitMode::Staged);
    let rx = watch(&store);

    store.set("MaxValue", i32::MAX).unwrap();
    assert!(drain(&rx).is_empty());
    assert!(store.is_empty());
    assert!(!store.is_dirty());
}

#[test]
fn set_null_on_absent_name_is_noop() {
    let (store, host) = store(CommitMode::Immediate);
    let rx = watch(&store);
    store.set("Notes", PropertyValue::Null).unwrap();
    assert!(drain(&rx).is_empty());
    assert_eq!(host.value("Notes"), None);
}

#[test]
fn set_on_absent_name_adds() {
    let (store, host) = store(CommitMode::Immediate);
    let rx = watch(&store);
    store.set("Notes", "hello").unwrap();

    assert_eq!(
        drain(&rx),
        vec![
            changing("Notes"),
            StoreEvent::Collection(CollectionChange::Add {
                name: "Notes".into(),
                value: "hello".into(),
            }),
            changed("Notes"),
        ]
    );
    assert_eq!(host.value("Notes"), Some("hello".into()));
}

#[test]
fn set_existing_emits_replace_in_order() {
    let (store, _host) = store(CommitMode::Staged);
    let rx = watch(&store);
    store.set("MinValue", 3).unwrap();

    let events = drain(&rx);
    assert_eq!(
        events,
        vec![
            changing("MinValue"),
            StoreEvent::Collection(CollectionChange::Replace {
                name: "MinValue".into(),
                old: PropertyValue::Int32(0),
                new: PropertyValue::Int32(3),
            }),
            changed("MinValue"),
        ]
    );
    match &events[1] {
        StoreEvent::Collection(change) => {
            assert_eq!(change.action(), CollectionAction::Replace);
            assert_eq!(change.name(), Some("MinValue"));
        }
        other => panic!("expected collection event, got {other:?}"),
    }
}

#[test]
fn set_after_null_adds_again() {
    let (store, _host) = store(CommitMode::Staged);
    store.set("Notes", "a").unwrap();
    store.set("Notes", PropertyValue::Null).unwrap();
    assert_eq!(store.try_get("Notes").unwrap(), Some(PropertyValue::Null));

    let rx = watch(&store);
    store.set("Notes", "b").unwrap();
    let events = drain(&rx);
    assert!(matches!(
        &events[1],
        StoreEvent::Collection(CollectionChange::Add { value, .. }) if value.as_str() == Some("b")
    ));
    assert_eq!(store.get_as::<String>("Notes").unwrap().as_deref(), Some("b"));
}

// ── add ──────────────────────────────────────────────────────────

#[test]
fn add_rejects_cached_name() {
    let (store, _host) = store(CommitMode::Staged);
    store.add("Notes", "first").unwrap();

    let rx = watch(&store);
    let err = store.add("Notes", "second").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(ref n) if n == "Notes"));
    assert_eq!(drain(&rx), vec![changing("Notes")]);
    assert_eq!(store.try_get("Notes").unwrap(), Some("first".into()));
}

#[test]
fn add_stages_in_staged_mode() {
    let (store, host) = store(CommitMode::Staged);
    store.add("Notes", "draft").unwrap();
    assert!(store.is_name_dirty("Notes"));
    assert_eq!(host.value("Notes"), None);
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn undefined_name_is_refused() {
    let (store, _host) = store(CommitMode::Staged);
    assert!(matches!(
        store.try_get("Missing").unwrap_err(),
        StoreError::UndefinedProperty(ref n) if n == "Missing"
    ));
    assert!(matches!(
        store.set("Missing", 1).unwrap_err(),
        StoreError::UndefinedProperty(_)
    ));
    assert!(matches!(
        store.remove("Missing").unwrap_err(),
        StoreError::UndefinedProperty(_)
    ));
}

#[test]
fn read_only_name_is_refused() {
    let (store, _host) = store(CommitMode::Immediate);
    let rx = watch(&store);
    let err = store.set("Today", PropertyValue::Null).unwrap_err();
    assert!(matches!(err, StoreError::NotWritable(ref n) if n == "Today"));
    assert!(err.is_validation());
    assert!(drain(&rx).is_empty());
    assert!(store.try_get("Today").unwrap().is_some());
}

#[test]
fn wrong_type_is_refused() {
    let (store, host) = store(CommitMode::Immediate);
    let err = store.set("MaxValue", "ten").unwrap_err();
    assert!(matches!(
        err,
        StoreError::TypeMismatch { ref expected, ref actual, .. }
            if expected == "System.Int32" && actual == "System.String"
    ));
    assert_eq!(host.value("MaxValue"), Some(PropertyValue::Int32(i32::MAX)));

    let err = store.set("IntList", vec![1_i32, 2]).unwrap_err();
    assert!(matches!(err, StoreError::TypeMismatch { .. }));
}

#[test]
fn validation_off_passes_anything_through() {
    let (store, host) = store(CommitMode::Immediate);
    store.set_validation_enabled(false);
    assert!(!store.validation_enabled());

    store.set("Undeclared", 42).unwrap();
    store.set("MaxValue", "ten").unwrap();
    assert_eq!(host.value("Undeclared"), Some(PropertyValue::Int32(42)));
    assert_eq!(host.value("MaxValue"), Some("ten".into()));

    store.set_validation_enabled(true);
    assert!(store.set("Other", 1).is_err());
}

#[test]
fn descriptor_changes_apply_to_later_writes() {
    let (store, _host) = store(CommitMode::Staged);
    store
        .descriptors()
        .write()
        .unwrap()
        .replace(PropertyDescriptor::new("MaxValue", PropertyType::Int32, true));
    assert!(matches!(
        store.set("MaxValue", 1).unwrap_err(),
        StoreError::NotWritable(_)
    ));
}

// ── remove / clear ───────────────────────────────────────────────

#[test]
fn staged_remove_discards_pending_value() {
    let (store, host) = store(CommitMode::Staged);
    store.set("MaxValue", 10).unwrap();
    let rx = watch(&store);

    assert!(store.remove("MaxValue").unwrap());
    assert_eq!(
        drain(&rx),
        vec![
            changing("MaxValue"),
            StoreEvent::Collection(CollectionChange::Remove {
                name: "MaxValue".into(),
                value: PropertyValue::Int32(10),
            }),
            changed("MaxValue"),
        ]
    );
    assert!(!store.is_dirty());
    assert_eq!(store.try_get("MaxValue").unwrap(), Some(PropertyValue::Int32(i32::MAX)));
    assert_eq!(host.value("MaxValue"), Some(PropertyValue::Int32(i32::MAX)));
}

#[test]
fn immediate_remove_resets_host() {
    let (store, host) = store(CommitMode::Immediate);
    store.set("MinValue", 9).unwrap();
    assert!(store.remove("MinValue").unwrap());
    assert_eq!(host.value("MinValue"), Some(PropertyValue::Int32(0)));
    assert!(!store.contains_key("MinValue"));
}

#[test]
fn remove_uncached_returns_false_after_changing() {
    let (store, _host) = store(CommitMode::Staged);
    let rx = watch(&store);
    assert!(!store.remove("MinValue").unwrap());
    assert_eq!(drain(&rx), vec![changing("MinValue")]);
}

#[test]
fn remove_entry_requires_matching_value() {
    let (store, _host) = store(CommitMode::Staged);
    store.set("MinValue", 4).unwrap();

    assert!(!store.remove_entry("MinValue", &PropertyValue::Int32(5)).unwrap());
    assert!(store.contains_key("MinValue"));
    assert!(store.remove_entry("MinValue", &PropertyValue::Int32(4)).unwrap());
    assert!(!store.contains_key("MinValue"));
}

#[test]
fn staged_clear_loses_pending_values() {
    let (store, host) = store(CommitMode::Staged);
    store.set("MinValue", 1).unwrap();
    store.set("MaxValue", 2).unwrap();
    let rx = watch(&store);

    store.clear().unwrap();
    assert_eq!(
        drain(&rx),
        vec![
            changing("MaxValue"),
            changing("MinValue"),
            StoreEvent::Collection(CollectionChange::Reset {
                removed: vec!["MaxValue".into(), "MinValue".into()],
            }),
            changed("MaxValue"),
            changed("MinValue"),
        ]
    );
    assert!(store.is_empty());
    assert!(!store.is_dirty());

    store.commit().unwrap();
    assert_eq!(host.value("MinValue"), Some(PropertyValue::Int32(0)));
    assert_eq!(host.value("MaxValue"), Some(PropertyValue::Int32(i32::MAX)));
}

#[test]
fn immediate_clear_resets_every_cached_name() {
    let (store, host) = store(CommitMode::Immediate);
    store.set("CurrentDirectory", "/tmp").unwrap();
    store.set("Notes", "x").unwrap();
    store.clear().unwrap();

    assert_eq!(host.value("CurrentDirectory"), Some(START_DIR.into()));
    assert_eq!(host.value("Notes"), None);
}

// ── Reads ────────────────────────────────────────────────────────

#[test]
fn get_or_falls_back_when_not_found() {
    let (store, _host) = store(CommitMode::Staged);
    assert_eq!(store.get_or("Notes", "none".into()).unwrap(), "none".into());
    assert_eq!(
        store.get_or("MinValue", PropertyValue::Int32(-1)).unwrap(),
        PropertyValue::Int32(0)
    );
}

#[test]
fn get_as_converts_or_reports_mismatch() {
    let (store, _host) = store(CommitMode::Staged);
    assert_eq!(store.get_as::<Vec<i32>>("IntList").unwrap(), Some(vec![4, 2, 1]));
    assert_eq!(store.get_as::<Vec<i32>>("Ints").unwrap(), Some(vec![3, 2, 1]));
    assert_eq!(store.get_as::<String>("Notes").unwrap(), None);
    assert!(matches!(
        store.get_as::<bool>("MaxValue").unwrap_err(),
        StoreError::TypeMismatch { .. }
    ));
}

#[test]
fn get_as_reads_null_as_none() {
    let (store, _host) = store(CommitMode::Staged);
    store.set("Notes", "a").unwrap();
    store.set("Notes", PropertyValue::Null).unwrap();
    assert_eq!(store.get_as::<String>("Notes").unwrap(), None);
    assert_eq!(store.get_as::<i32>("Notes").unwrap(), None);

    let host = Arc::new(MemoryAccessor::with_values([("MinValue", PropertyValue::Null)]));
    let immediate = PropertyStore::new(descriptors(), host, CommitMode::Immediate);
    assert_eq!(immediate.try_get("MinValue").unwrap(), Some(PropertyValue::Null));
    assert_eq!(immediate.get_as::<i32>("MinValue").unwrap(), None);
}

// ── Observers ────────────────────────────────────────────────────

#[test]
fn unsubscribed_observer_hears_nothing() {
    let (store, _host) = store(CommitMode::Staged);
    let counter = Arc::new(CountingObserver::default());
    let id = store.subscribe(counter.clone());

    store.set("MinValue", 1).unwrap();
    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.set("MinValue", 2).unwrap();

    assert_eq!(*counter.changing.lock().unwrap(), 1);
    assert_eq!(*counter.changed.lock().unwrap(), 1);
}

// ── Configuration ────────────────────────────────────────────────

#[test]
fn from_config_applies_mode_and_validation() {
    let config = StoreConfig::from_json_str(r#"{"immediateCommit": true, "validation": false}"#)
        .unwrap();
    let store = PropertyStore::from_config(descriptors().into_shared(), host(), config);
    assert_eq!(store.mode(), CommitMode::Immediate);
    assert!(!store.validation_enabled());
}

#[test]
fn config_defaults_to_staged_and_validated() {
    let config = StoreConfig::from_json_str("{}").unwrap();
    assert_eq!(config, StoreConfig::default());
    assert_eq!(config.mode(), CommitMode::Staged);
    assert!(config.validation);
}

#[test]
fn shared_descriptors_serve_several_stores() {
    let shared = descriptors().into_shared();
    let a = PropertyStore::with_shared(Arc::clone(&shared), host(), CommitMode::Staged);
    let b = PropertyStore::with_shared(Arc::clone(&shared), host(), CommitMode::Immediate);
    shared
        .write()
        .unwrap()
        .add(PropertyDescriptor::new("Late", PropertyType::Bool, false))
        .unwrap();

    a.set("Late", true).unwrap();
    b.set("Late", false).unwrap();
    assert_eq!(a.get_as::<bool>("Late").unwrap(), Some(true));
    assert_eq!(b.accessor().value("Late"), Some(PropertyValue::Bool(false)));
}

// ── End to end ───────────────────────────────────────────────────

#[test]
fn current_directory_round_trip() {
    let (store, host) = store(CommitMode::Staged);
    assert_eq!(
        store.get_as::<String>("CurrentDirectory").unwrap().as_deref(),
        Some(START_DIR)
    );

    store.set("CurrentDirectory", "/tmp/work").unwrap();
    assert_eq!(host.value("CurrentDirectory"), Some(START_DIR.into()));
    assert!(store.is_name_dirty("CurrentDirectory"));

    store.commit().unwrap();
    assert_eq!(host.value("CurrentDirectory"), Some("/tmp/work".into()));

    assert!(store.remove("CurrentDirectory").unwrap());
    assert_eq!(
        store.get_as::<String>("CurrentDirectory").unwrap().as_deref(),
        Some("/tmp/work")
    );
}
