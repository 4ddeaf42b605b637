// The `lastPalette` cache must behave the same on every store implementation.
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use palette_extractor::palette::ExtractionResult;
use palette_extractor::storage::{
    JsonFileStore, KeyValueStore, MemoryStore, PaletteCache, SqliteStore, LAST_PALETTE_KEY,
};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    std::env::temp_dir().join(format!("palette-extractor-{tag}-{nanos}"))
}

fn sample() -> ExtractionResult {
    ExtractionResult::new(
        vec!["#FA0000".to_string(), "#0000FA".to_string()],
        false,
        "split.png",
    )
}

fn exercise<S: KeyValueStore>(store: S) -> S {
    let cache = PaletteCache::new(store);
    assert!(cache.load().is_none());

    let result = sample();
    assert!(cache.save(&result));
    assert_eq!(cache.load(), Some(result));

    cache.store().set(LAST_PALETTE_KEY, "[]").expect("overwrite with wrong shape");
    assert!(cache.load().is_none(), "wrong-shape payload must read as absent");

    assert!(cache.save(&sample()));
    assert!(cache.clear());
    assert!(cache.load().is_none());

    assert!(cache.save(&sample()));
    cache.into_store()
}

#[test]
fn memory_store_cache() {
    let store = exercise(MemoryStore::new());
    assert!(store.get(LAST_PALETTE_KEY).expect("get").is_some());
}

#[test]
fn json_file_store_cache_persists() {
    let dir = unique_temp_dir("json-cache");
    let path = dir.join("cache.json");

    exercise(JsonFileStore::new(&path));

    let reopened = PaletteCache::new(JsonFileStore::new(&path));
    assert_eq!(reopened.load().map(|r| r.source_name), Some("split.png".to_string()));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn sqlite_store_cache_persists() {
    let dir = unique_temp_dir("sqlite-cache");
    let path = dir.join("palette.db");

    let store = exercise(SqliteStore::open(&path).expect("open sqlite"));
    drop(store);

    let reopened = PaletteCache::new(SqliteStore::open(&path).expect("reopen sqlite"));
    assert_eq!(reopened.load().map(|r| r.colors.len()), Some(2));

    let _ = fs::remove_dir_all(dir);
}
