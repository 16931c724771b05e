//! Same semantic contract across adapters: every test runs against both the
//! in-memory and the SQLite store through the trait object.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use codeatlas_store::infrastructure::{InMemorySnapshotStore, SqliteSnapshotStore};
use codeatlas_store::{Chunk, ChunkKind, Dependency, Repository, Snapshot, SnapshotStore};

fn adapters() -> Vec<(&'static str, Arc<dyn SnapshotStore>)> {
    vec![
        ("memory", Arc::new(InMemorySnapshotStore::new())),
        ("sqlite", Arc::new(SqliteSnapshotStore::in_memory().unwrap())),
    ]
}

async fn seed(store: &Arc<dyn SnapshotStore>) {
    store
        .save_repository(&Repository::new("r1", "repo-one"))
        .await
        .unwrap();
    store.save_snapshot(&Snapshot::new("r1", "main")).await.unwrap();
}

fn chunk(id: &str, file: &str, content: &str) -> Chunk {
    Chunk::new(
        id,
        "r1",
        "r1:main",
        ChunkKind::Function,
        id,
        file,
        0,
        4,
        content,
    )
}

#[tokio::test]
async fn save_chunks_is_idempotent_everywhere() {
    for (name, store) in adapters() {
        seed(&store).await;
        let c = chunk("chunk:r1:function:m.f", "m.py", "x = 1");
        store.save_chunks(std::slice::from_ref(&c)).await.unwrap();
        store.save_chunks(std::slice::from_ref(&c)).await.unwrap();
        let live = store.get_chunks("r1", "r1:main").await.unwrap();
        assert_eq!(live.len(), 1, "adapter {name}");
        assert_eq!(live[0].content, "x = 1", "adapter {name}");
    }
}

#[tokio::test]
async fn soft_delete_revive_round_trip_everywhere() {
    for (name, store) in adapters() {
        seed(&store).await;
        store
            .save_chunk(&chunk("chunk:r1:function:m.f", "m.py", "x = 1"))
            .await
            .unwrap();
        store
            .soft_delete_file_chunks("r1", "r1:main", "m.py")
            .await
            .unwrap();
        assert!(
            store.get_chunks("r1", "r1:main").await.unwrap().is_empty(),
            "adapter {name}"
        );

        store
            .save_chunk(&chunk("chunk:r1:function:m.f", "m.py", "x = 2"))
            .await
            .unwrap();
        let live = store.get_chunks("r1", "r1:main").await.unwrap();
        assert_eq!(live.len(), 1, "adapter {name}");
        assert_eq!(live[0].content, "x = 2", "adapter {name}");
        assert_eq!(live[0].version, 2, "adapter {name}");
        assert!(!live[0].is_deleted, "adapter {name}");
    }
}

#[tokio::test]
async fn file_metadata_supports_early_cutoff_everywhere() {
    for (name, store) in adapters() {
        seed(&store).await;
        assert!(
            store
                .get_file_hash("r1", "r1:main", "m.py")
                .await
                .unwrap()
                .is_none(),
            "adapter {name}"
        );
        store
            .update_file_metadata("r1", "r1:main", "m.py", "hash-1", 1)
            .await
            .unwrap();
        store
            .update_file_metadata("r1", "r1:main", "m.py", "hash-2", 2)
            .await
            .unwrap();
        let meta = store
            .get_file_metadata("r1", "r1:main", "m.py")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meta.content_hash, "hash-2", "adapter {name}");
        assert_eq!(meta.last_indexed_txn, 2, "adapter {name}");
    }
}

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("atlas.db");

    {
        let store: Arc<dyn SnapshotStore> =
            Arc::new(SqliteSnapshotStore::open(&db_path).unwrap());
        seed(&store).await;
        store
            .save_chunk(&chunk("chunk:r1:function:m.f", "m.py", "x = 1"))
            .await
            .unwrap();
    }

    let reopened: Arc<dyn SnapshotStore> =
        Arc::new(SqliteSnapshotStore::open(&db_path).unwrap());
    let live = reopened.get_chunks("r1", "r1:main").await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].chunk_id, "chunk:r1:function:m.f");
}

#[tokio::test]
async fn transitive_dependencies_agree_everywhere() {
    for (name, store) in adapters() {
        seed(&store).await;
        store
            .save_dependencies(&[
                Dependency::new("a", "b", "CALLS"),
                Dependency::new("b", "c", "CALLS"),
                Dependency::new("c", "d", "IMPORTS"),
            ])
            .await
            .unwrap();
        let reachable = store.get_transitive_dependencies("a", 2).await.unwrap();
        assert_eq!(reachable, vec!["b".to_string(), "c".to_string()], "adapter {name}");
    }
}
