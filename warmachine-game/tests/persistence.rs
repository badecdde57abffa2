use tempfile::TempDir;
use warmachine_game::constants::{BACKUP_KEY, STATE_VERSION, STORAGE_KEY};
use warmachine_game::{
    AppState, Character, DelveEngine, FileStorage, PartyState, SeededSource, StateStorage,
    Store, StoreError, roll_treasure_hoard, set_treasure_type,
};

fn played_store(storage: FileStorage) -> Store<FileStorage> {
    let store = Store::open(storage);
    store.update(|state| {
        state.party = PartyState::with_roster(vec![
            Character::new("Aldric", "Fighter", 2, 14, 3, 19),
            Character::new("Mira", "Magic-User", 1, 3, 9, 19).with_spell("Sleep", 1),
        ]);
    });
    {
        let mut engine = DelveEngine::new(&store, SeededSource::from_seed(2024));
        engine.sync_with_party();
        for _ in 0..6 {
            engine.search_room();
            engine.rest_party();
        }
        engine.explore_room();
    }
    set_treasure_type(&store, "H");
    roll_treasure_hoard(&store, &mut SeededSource::from_seed(7));
    store
}

#[test]
fn snapshot_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let before = played_store(FileStorage::new(dir.path())).get_state();
    assert!(FileStorage::new(dir.path()).path_for(STORAGE_KEY).exists());

    let reopened = Store::open(FileStorage::new(dir.path())).get_state();
    assert_eq!(reopened, before);
}

#[test]
fn stale_version_on_disk_is_ignored() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path());
    let mut stale = serde_json::to_value(AppState::default()).unwrap();
    stale["meta"]["version"] = serde_json::Value::from("0.1.0");
    stale["dungeon"]["turn"] = serde_json::Value::from(77);
    storage.write(STORAGE_KEY, &stale.to_string()).unwrap();

    let store = Store::open(storage);
    assert_eq!(store.get_state().dungeon.turn, 0);
    assert_eq!(store.get_state().meta.version, STATE_VERSION);
}

#[test]
fn export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = played_store(FileStorage::new(dir.path()));
    let snapshot = store.get_state();
    let exported = store.export_state().unwrap();

    let other_dir = TempDir::new().unwrap();
    let fresh = Store::open(FileStorage::new(other_dir.path()));
    fresh.import_state(&exported).unwrap();

    let mut imported = fresh.get_state();
    assert!(imported.meta.last_updated >= snapshot.meta.last_updated);
    imported.meta.last_updated = snapshot.meta.last_updated;
    assert_eq!(imported, snapshot);

    let backup = FileStorage::new(other_dir.path())
        .read(BACKUP_KEY)
        .unwrap()
        .expect("backup written before import");
    let backup: AppState = serde_json::from_str(&backup).unwrap();
    assert_eq!(backup.dungeon.turn, 0);
}

#[test]
fn rejected_import_leaves_disk_untouched() {
    let dir = TempDir::new().unwrap();
    let store = played_store(FileStorage::new(dir.path()));
    let on_disk = FileStorage::new(dir.path()).read(STORAGE_KEY).unwrap();

    let mut envelope: serde_json::Value =
        serde_json::from_str(&store.export_state().unwrap()).unwrap();
    envelope["state"]["meta"]["version"] = serde_json::Value::from("9.9.9");
    let err = store.import_state(&envelope.to_string()).unwrap_err();
    assert!(matches!(err, StoreError::VersionMismatch { .. }));
    assert!(err.to_string().contains("9.9.9"));

    assert_eq!(FileStorage::new(dir.path()).read(STORAGE_KEY).unwrap(), on_disk);
    assert!(FileStorage::new(dir.path()).read(BACKUP_KEY).unwrap().is_none());
}
