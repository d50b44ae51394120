#[cfg(test)]
mod test {

    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::sleep;

    use crate::cache::cache_manager::{META_LIBRARIES_KEY, META_VERSION_KEY};
    use crate::cache::{CacheError, CacheManager, Ttl};
    use crate::config::metadata::{MemoryMetadata, MetadataStore};

    #[tokio::test(start_paused = true)]
    async fn session_library_entries_expire_with_library_ttl() {
        let cache: CacheManager<String> = CacheManager::new();
        cache.register_library("sessions", 5).await.unwrap();

        cache.set("sessions", "u1", "Alice".to_string()).await.unwrap();
        assert_eq!(cache.get("sessions", "u1").await.as_deref(), Some("Alice"));

        sleep(Duration::from_secs(6)).await;
        assert_eq!(cache.get("sessions", "u1").await, None);
        assert!(cache.keys("sessions").await.is_empty());
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first_library() {
        let cache: CacheManager<u32> = CacheManager::new();
        cache.register_library("lib", -1).await.unwrap();
        cache.set("lib", "k", 1).await.unwrap();

        let err = cache.register_library("lib", 10).await.unwrap_err();
        assert_eq!(err, CacheError::LibraryExists("lib".to_string()));

        assert_eq!(cache.get("lib", "k").await, Some(1));
        assert_eq!(cache.library_ttl("lib").await, Some(Ttl::Never));
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn input_validation_has_no_side_effects() {
        let cache: CacheManager<u32> = CacheManager::new();

        assert_eq!(cache.register_library("", 1).await, Err(CacheError::EmptyLibraryName));
        assert!(cache.libraries().await.is_empty());

        cache.register_library("lib", -1).await.unwrap();
        assert_eq!(cache.set("", "k", 1).await, Err(CacheError::EmptyLibraryName));
        assert_eq!(cache.set("lib", "", 1).await, Err(CacheError::EmptyKey));
        assert_eq!(
            cache.set("missing", "k", 1).await,
            Err(CacheError::LibraryNotFound("missing".to_string()))
        );
        assert!(cache.keys("lib").await.is_empty());
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_library_fails_soft() {
        let cache: CacheManager<u32> = CacheManager::new();

        assert_eq!(cache.get("nope", "k").await, None);
        assert!(cache.keys("nope").await.is_empty());
        assert!(!cache.refresh("nope", "k").await);
        assert!(!cache.remove("nope", "k").await);
        cache.clear("nope").await;
        assert!(cache.store("nope").await.is_none());
    }

    #[tokio::test]
    async fn clear_keeps_registration() {
        let cache: CacheManager<usize> = CacheManager::new();
        cache.register_library("lib", -1).await.unwrap();
        for i in 0..100 {
            cache.set("lib", &format!("key_{}", i), i).await.unwrap();
        }
        assert_eq!(cache.keys("lib").await.len(), 100);

        cache.clear("lib").await;
        assert!(cache.keys("lib").await.is_empty());

        cache.set("lib", "again", 1).await.unwrap();
        assert_eq!(cache.get("lib", "again").await, Some(1));
        cache.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn libraries_have_independent_ttls() {
        let cache: CacheManager<&'static str> = CacheManager::new();
        cache.register_library("short", 1).await.unwrap();
        cache.register_library("long", 60).await.unwrap();
        cache.register_library("forever", -1).await.unwrap();

        for lib in ["short", "long", "forever"] {
            cache.set(lib, "k", lib).await.unwrap();
        }

        sleep(Duration::from_secs(3)).await;
        assert_eq!(cache.get("short", "k").await, None);
        assert_eq!(cache.get("long", "k").await, Some("long"));
        assert_eq!(cache.get("forever", "k").await, Some("forever"));

        sleep(Duration::from_secs(120)).await;
        assert_eq!(cache.get("long", "k").await, None);
        assert_eq!(cache.get("forever", "k").await, Some("forever"));
        cache.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_through_manager_extends_entry() {
        let cache: CacheManager<u8> = CacheManager::new();
        cache.register_library("lib", 2).await.unwrap();
        cache.set("lib", "k", 1).await.unwrap();

        sleep(Duration::from_millis(1500)).await;
        assert!(cache.refresh("lib", "k").await);
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(cache.get("lib", "k").await, Some(1));
        cache.shutdown().await;
    }

    #[tokio::test]
    async fn removed_library_can_be_registered_again() {
        let cache: CacheManager<u8> = CacheManager::new();
        cache.register_library("lib", -1).await.unwrap();
        cache.set("lib", "k", 1).await.unwrap();
        let store = cache.store("lib").await.unwrap();

        assert!(cache.remove_library("lib").await);
        assert!(!cache.remove_library("lib").await);
        assert!(store.is_destroyed());
        assert_eq!(cache.get("lib", "k").await, None);

        cache.register_library("lib", 5).await.unwrap();
        assert_eq!(cache.library_ttl("lib").await, Some(Ttl::from_secs(5)));
        assert!(cache.keys("lib").await.is_empty());
        cache.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn library_with_huge_ttl_accepts_writes() {
        let cache: CacheManager<u8> = CacheManager::new();
        cache.register_library("huge", i64::MAX).await.unwrap();

        cache.set("huge", "k", 1).await.unwrap();
        sleep(Duration::from_secs(3600)).await;

        assert_eq!(cache.get("huge", "k").await, Some(1));
        assert!(cache.refresh("huge", "k").await);
        cache.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn writes_racing_library_removal_never_land_in_dead_store() {
        let cache: Arc<CacheManager<usize>> = Arc::new(CacheManager::new());
        cache.register_library("doomed", -1).await.unwrap();
        let store = cache.store("doomed").await.unwrap();

        let mut writers = Vec::new();
        for worker in 0..8 {
            let cache = cache.clone();
            writers.push(tokio::spawn(async move {
                let mut i = 0;
                loop {
                    match cache.set("doomed", &format!("{}:{}", worker, i), i).await {
                        Ok(()) => i += 1,
                        Err(err) => return err,
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        sleep(Duration::from_millis(20)).await;
        assert!(cache.remove_library("doomed").await);

        for writer in writers {
            let err = writer.await.unwrap();
            assert!(
                matches!(err, CacheError::LibraryNotFound(_) | CacheError::StoreUnavailable(_)),
                "{:?}",
                err
            );
        }
        assert!(store.is_destroyed());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn set_after_shutdown_reports_unavailable_store() {
        let cache: CacheManager<u8> = CacheManager::new();
        cache.register_library("lib", -1).await.unwrap();
        cache.shutdown().await;

        assert_eq!(
            cache.set("lib", "k", 1).await,
            Err(CacheError::StoreUnavailable("lib".to_string()))
        );
        assert_eq!(cache.libraries().await, vec!["lib".to_string()]);
    }

    #[tokio::test]
    async fn metadata_records_version_and_libraries() {
        let cache: CacheManager<u8> = CacheManager::new();
        cache.register_library("b", 1).await.unwrap();
        cache.register_library("a", 1).await.unwrap();

        let meta = MemoryMetadata::new();
        cache.record_metadata(&meta).await.unwrap();

        assert_eq!(meta.get_value(META_VERSION_KEY).as_deref(), Some(env!("CARGO_PKG_VERSION")));
        assert_eq!(meta.get_value(META_LIBRARIES_KEY).as_deref(), Some("a,b"));
        cache.shutdown().await;
    }
}
