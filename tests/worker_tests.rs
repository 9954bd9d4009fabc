use std::sync::Arc;

use bytes::Bytes;
use file_pipeline::config::WorkerConfig;
use file_pipeline::object_store::{LocalStore, ObjectStore};
use file_pipeline::queue::{LocalQueue, ObjectCreatedEvent, Queue};
use file_pipeline::storage::models::FileRecord;
use file_pipeline::storage::Database;
use file_pipeline::worker::{ProcessError, Worker};

const BUCKET: &str = "my-test-bucket";

struct Harness {
    _dir: tempfile::TempDir,
    db: Database,
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn Queue>,
    worker: Worker,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    let store: Arc<dyn ObjectStore> =
        Arc::new(LocalStore::new(dir.path().join("files"), BUCKET).unwrap());
    let queue: Arc<dyn Queue> = Arc::new(LocalQueue::new(db.clone()));
    let config = WorkerConfig {
        batch_size: 10,
        ..WorkerConfig::default()
    };
    let worker = Worker::new(config, db.clone(), Arc::clone(&store), Arc::clone(&queue));
    Harness {
        _dir: dir,
        db,
        store,
        queue,
        worker,
    }
}

impl Harness {
    async fn upload(&self, id: &str, name: &str, content: &str) -> FileRecord {
        let record = FileRecord::new(id.to_string(), name.to_string(), content.len() as u64);
        self.db.put_file(&record).unwrap();
        self.store
            .put(&record.storage_key, Bytes::from(content.to_string()))
            .await
            .unwrap();
        record
    }
}

fn notification(bucket: &str, key: &str) -> String {
    serde_json::to_string(&ObjectCreatedEvent::single(bucket, key)).unwrap()
}

#[tokio::test]
async fn test_processes_uploaded_file() {
    let h = harness();
    let file = h.upload("file-1", "hello.txt", "Hello, World!").await;

    let outcomes = h
        .worker
        .handle_message(&notification(BUCKET, &file.storage_key))
        .await;
    assert_eq!(outcomes.len(), 1);
    let result = outcomes.into_iter().next().unwrap().unwrap();
    assert_eq!(result.file_id, "file-1");
    assert_eq!(result.result, "Processed file with 2 words and 13 characters");

    let stored = h.db.get_result("file-1").unwrap().unwrap();
    assert_eq!(stored, result);
}

#[tokio::test]
async fn test_handles_encoded_keys() {
    let h = harness();
    let file = h.upload("file-2", "my notes.txt", "one two three").await;

    let outcomes = h
        .worker
        .handle_message(&notification(BUCKET, &file.storage_key))
        .await;
    assert!(outcomes[0].is_ok());
    assert_eq!(
        h.db.get_result("file-2").unwrap().unwrap().result,
        "Processed file with 3 words and 13 characters"
    );
}

#[tokio::test]
async fn test_redelivery_leaves_single_row() {
    let h = harness();
    let file = h.upload("file-1", "a.txt", "Hello, World!").await;
    let body = notification(BUCKET, &file.storage_key);

    let first = h.worker.handle_message(&body).await.remove(0).unwrap();
    let second = h.worker.handle_message(&body).await.remove(0).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(h.db.get_result("file-1").unwrap().unwrap().id, first.id);
}

#[tokio::test]
async fn test_malformed_body_is_skipped() {
    let h = harness();
    let outcomes = h.worker.handle_message("not json").await;
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], Err(ProcessError::MalformedMessage(_))));
}

#[tokio::test]
async fn test_body_without_records_is_empty() {
    let h = harness();
    assert!(h.worker.handle_message(r#"{"Event":"s3:TestEvent"}"#).await.is_empty());
}

#[tokio::test]
async fn test_malformed_key_is_skipped() {
    let h = harness();
    let outcomes = h.worker.handle_message(&notification(BUCKET, "orphan.txt")).await;
    assert!(matches!(outcomes[0], Err(ProcessError::MalformedKey(_))));
}

#[tokio::test]
async fn test_foreign_bucket_is_ignored() {
    let h = harness();
    let file = h.upload("file-1", "a.txt", "text").await;

    let outcomes = h
        .worker
        .handle_message(&notification("someone-elses-bucket", &file.storage_key))
        .await;
    assert!(matches!(outcomes[0], Err(ProcessError::ForeignBucket(_))));
    assert!(h.db.get_result("file-1").unwrap().is_none());
}

#[tokio::test]
async fn test_missing_object_is_fetch_error() {
    let h = harness();
    let outcomes = h
        .worker
        .handle_message(&notification(BUCKET, "files/ghost/a.txt"))
        .await;
    assert!(matches!(outcomes[0], Err(ProcessError::Fetch { .. })));
}

#[tokio::test]
async fn test_object_without_file_record_writes_nothing() {
    let h = harness();
    h.store
        .put("files/unknown/a.txt", Bytes::from("stray object"))
        .await
        .unwrap();

    let outcomes = h
        .worker
        .handle_message(&notification(BUCKET, "files/unknown/a.txt"))
        .await;
    assert!(matches!(outcomes[0], Err(ProcessError::UnknownFile(_))));
    assert!(h.db.get_result("unknown").unwrap().is_none());
}

#[tokio::test]
async fn test_records_in_one_message_are_independent() {
    let h = harness();
    let good = h.upload("good", "a.txt", "one two").await;

    let mut event = ObjectCreatedEvent::single(BUCKET, "files/missing/a.txt");
    event
        .records
        .extend(ObjectCreatedEvent::single(BUCKET, &good.storage_key).records);
    let body = serde_json::to_string(&event).unwrap();

    let outcomes = h.worker.handle_message(&body).await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_err());
    assert!(outcomes[1].is_ok());
    assert!(h.db.get_result("good").unwrap().is_some());
}

#[tokio::test]
async fn test_run_batch_acknowledges_every_message() {
    let h = harness();
    let file = h.upload("file-1", "a.txt", "Hello, World!").await;

    h.queue
        .send(&notification(BUCKET, &file.storage_key))
        .await
        .unwrap();
    h.queue.send("garbage").await.unwrap();

    assert_eq!(h.worker.run_batch().await.unwrap(), 2);
    assert!(h.queue.receive(10).await.unwrap().is_empty());
    assert!(h.db.get_result("file-1").unwrap().is_some());

    assert_eq!(h.worker.run_batch().await.unwrap(), 0);
}
