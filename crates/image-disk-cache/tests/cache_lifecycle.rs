use image_disk_cache::{
    derive_key, CacheConfig, CacheError, Dimensions, ImageCache, NoOpLogger, CACHE_TTL_SECS,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn cache_in(folder: &Path, max_size_bytes: u64) -> ImageCache {
    let config = CacheConfig {
        enabled: true,
        folder: folder.to_path_buf(),
        max_size_bytes,
    };
    ImageCache::with_logger(config, Arc::new(NoOpLogger))
}

#[test]
fn test_key_survives_new_cache_instance() {
    let dir = tempdir().unwrap();
    let dims = Dimensions::new(800, 600);

    cache_in(dir.path(), 0).put("uploads/2024/sunset.png", dims, b"png bytes");

    // A fresh instance (as after a restart) finds the same file
    let image = cache_in(dir.path(), 0)
        .get("uploads/2024/sunset.png", dims)
        .unwrap();
    assert_eq!(image.bytes, b"png bytes");
    assert_eq!(image.mime_type, "image/png");
}

#[test]
fn test_external_tooling_can_recompute_file_names() {
    let dir = tempdir().unwrap();
    let cache = cache_in(dir.path(), 0);
    let dims = Dimensions::new(100, 100);

    cache.put("photos/cat.jpg", dims, b"cat");

    let key = derive_key(dir.path(), "photos/cat.jpg", dims).unwrap();
    assert_eq!(fs::read(&key.path).unwrap(), b"cat");
    assert!(matches!(
        derive_key(dir.path(), "photos/cat", dims),
        Err(CacheError::MalformedPath(_))
    ));
}

#[test]
fn test_sweep_reclaims_what_lookups_skip() {
    let dir = tempdir().unwrap();
    let cache = cache_in(dir.path(), 0);
    let dims = Dimensions::new(10, 10);

    cache.put("cat.jpg", dims, b"cat");
    let key = cache.key_for("cat.jpg", dims).unwrap();
    let file = fs::File::options().write(true).open(&key.path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(CACHE_TTL_SECS as u64 + 60))
        .unwrap();
    drop(file);

    assert!(cache.get("cat.jpg", dims).is_none());
    assert!(key.path.exists());

    let report = cache.sweep().unwrap();
    assert_eq!(report.stale_removed, 1);
    assert!(!key.path.exists());
}

#[test]
fn test_concurrent_writers_never_expose_partial_files() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(cache_in(dir.path(), 0));
    let dims = Dimensions::new(256, 256);
    const SIZE: usize = 256 * 1024;

    cache.put("tile.png", dims, &vec![0u8; SIZE]);

    let writers: Vec<_> = (1..=4u8)
        .map(|fill| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let bytes = vec![fill; SIZE];
                for _ in 0..20 {
                    cache.put("tile.png", dims, &bytes);
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..50 {
                    if let Some(image) = cache.get("tile.png", dims) {
                        assert_eq!(image.bytes.len(), SIZE);
                        let first = image.bytes[0];
                        assert!(image.bytes.iter().all(|b| *b == first));
                    }
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(cache.stats().write_failures, 0);
    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
}

#[test]
fn test_sweep_enforces_size_budget_after_many_puts() {
    let dir = tempdir().unwrap();
    let cache = cache_in(dir.path(), 10 * 1024);

    for i in 0..20u32 {
        cache.put("photo.jpg", Dimensions::new(i, i), &[7u8; 1024]);
    }

    let report = cache.sweep().unwrap();
    assert_eq!(report.scanned, 20);
    assert!(report.size_after <= 9 * 1024);
    assert_eq!(report.size_after, report.size_before - report.bytes_freed);
}
