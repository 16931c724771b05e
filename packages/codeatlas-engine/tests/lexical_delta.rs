//! Lexical plugin end-to-end: a commit that removes one file and adds
//! another leaves the index with no hits from the removed file and the
//! watermark at the commit's txn.

use std::sync::Arc;

use codeatlas_engine::config::EngineConfig;
use codeatlas_engine::features::multi_index::IndexPlugin;
use codeatlas_engine::features::parsing::SourceFile;
use codeatlas_engine::IndexingSubsystem;
use codeatlas_store::infrastructure::InMemorySnapshotStore;
use codeatlas_store::SnapshotStore;

fn subsystem() -> IndexingSubsystem {
    let store: Arc<dyn SnapshotStore> = Arc::new(InMemorySnapshotStore::new());
    IndexingSubsystem::new(store, "r1", "r1:main", EngineConfig::default()).unwrap()
}

#[tokio::test]
async fn delta_removes_old_file_hits_and_indexes_new_file() {
    let subsystem = subsystem();

    // snapshot S0: x.ts defines fooHandler
    let s0 = vec![SourceFile::new(
        "x.ts",
        "export function fooHandler() { return 1; }\n",
    )];
    let full = subsystem.pipeline.run_full("r1", "main", s0).await.unwrap();
    assert_eq!(subsystem.lexical.applied_up_to(), full.txn_id.unwrap());

    let hits = subsystem.lexical.search("fooHandler", 10).unwrap();
    assert!(hits.iter().any(|h| h.file_path == "x.ts"));

    // delta: x.ts removed, y.ts added (also mentions fooHandler)
    let s1 = vec![SourceFile::new(
        "y.ts",
        "export function fooHandler() { return 2; }\n",
    )];
    let incremental = subsystem
        .pipeline
        .run_incremental("r1", "main", s1)
        .await
        .unwrap();

    let hits = subsystem.lexical.search("fooHandler", 10).unwrap();
    assert!(
        hits.iter().all(|h| h.file_path != "x.ts"),
        "removed file must not produce hits"
    );
    assert!(hits.iter().any(|h| h.file_path == "y.ts"));
    assert_eq!(
        subsystem.lexical.applied_up_to(),
        incremental.txn_id.unwrap(),
        "watermark equals the commit txn"
    );
}

#[tokio::test]
async fn soft_deleted_chunks_disappear_from_store_queries() {
    let subsystem = subsystem();
    subsystem
        .pipeline
        .run_full(
            "r1",
            "main",
            vec![SourceFile::new("gone.py", "def vanish():\n    pass\n")],
        )
        .await
        .unwrap();
    assert!(!subsystem
        .store
        .get_chunks("r1", "r1:main")
        .await
        .unwrap()
        .is_empty());

    // re-index with the file absent: its chunks soft-delete
    subsystem
        .pipeline
        .run_incremental("r1", "main", vec![SourceFile::new("stay.py", "def stay():\n    pass\n")])
        .await
        .unwrap();

    let live = subsystem.store.get_chunks("r1", "r1:main").await.unwrap();
    assert!(live.iter().all(|c| c.file_path != "gone.py"));
    assert!(live.iter().any(|c| c.file_path == "stay.py"));
}
