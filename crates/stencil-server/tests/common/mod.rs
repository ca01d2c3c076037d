#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::transport::Channel;

use stencil_server::config::{ServerConfig, StoreBackend};
use stencil_server::error::ServerError;
use stencil_server::proto::v1::template_service_client::TemplateServiceClient;
use stencil_server::repository::TemplateRepository;
use stencil_server::server::TemplateServer;
use stencil_server::service::TemplateApi;
use stencil_storage::{
    BoxFuture, Collection, Cursor, DeleteResult, Document, DocumentStore, Filter, InsertOneResult,
    MemoryStore, Namespace, StoreError, Update, UpdateResult,
};

/// Wraps a store and counts every collection call made through it.
pub struct CountingStore {
    inner: MemoryStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentStore for CountingStore {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn Collection> {
        Arc::new(CountingCollection {
            inner: self.inner.collection(database, collection),
            calls: self.calls.clone(),
        })
    }
}

struct CountingCollection {
    inner: Arc<dyn Collection>,
    calls: Arc<AtomicUsize>,
}

impl CountingCollection {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Collection for CountingCollection {
    fn namespace(&self) -> &Namespace {
        self.inner.namespace()
    }

    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult, StoreError>> {
        self.hit();
        self.inner.insert_one(document)
    }

    fn find_one(&self, filter: Filter) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        self.hit();
        self.inner.find_one(filter)
    }

    fn update_one(
        &self,
        filter: Filter,
        update: Update,
    ) -> BoxFuture<'_, Result<UpdateResult, StoreError>> {
        self.hit();
        self.inner.update_one(filter, update)
    }

    fn delete_one(&self, filter: Filter) -> BoxFuture<'_, Result<DeleteResult, StoreError>> {
        self.hit();
        self.inner.delete_one(filter)
    }

    fn find(&self, filter: Filter) -> BoxFuture<'_, Result<Box<dyn Cursor>, StoreError>> {
        self.hit();
        self.inner.find(filter)
    }
}

/// Wraps a store so that `find` waits `delay` before opening its cursor.
///
/// Records whether a `find` started, ran to completion, or was torn down
/// (dropped) either way.
pub struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
    progress: Arc<FindProgress>,
}

#[derive(Default)]
pub struct FindProgress {
    pub started: AtomicBool,
    pub finished: AtomicBool,
    pub dropped: AtomicBool,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
            progress: Arc::new(FindProgress::default()),
        }
    }

    pub fn progress(&self) -> Arc<FindProgress> {
        self.progress.clone()
    }
}

impl DocumentStore for SlowStore {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn Collection> {
        Arc::new(SlowCollection {
            inner: self.inner.collection(database, collection),
            delay: self.delay,
            progress: self.progress.clone(),
        })
    }
}

struct SlowCollection {
    inner: Arc<dyn Collection>,
    delay: Duration,
    progress: Arc<FindProgress>,
}

/// Marks `dropped` when the `find` future is released, finished or not.
struct DropMarker(Arc<FindProgress>);

impl Drop for DropMarker {
    fn drop(&mut self) {
        self.0.dropped.store(true, Ordering::SeqCst);
    }
}

impl Collection for SlowCollection {
    fn namespace(&self) -> &Namespace {
        self.inner.namespace()
    }

    fn insert_one(&self, document: Document) -> BoxFuture<'_, Result<InsertOneResult, StoreError>> {
        self.inner.insert_one(document)
    }

    fn find_one(&self, filter: Filter) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        self.inner.find_one(filter)
    }

    fn update_one(
        &self,
        filter: Filter,
        update: Update,
    ) -> BoxFuture<'_, Result<UpdateResult, StoreError>> {
        self.inner.update_one(filter, update)
    }

    fn delete_one(&self, filter: Filter) -> BoxFuture<'_, Result<DeleteResult, StoreError>> {
        self.inner.delete_one(filter)
    }

    fn find(&self, filter: Filter) -> BoxFuture<'_, Result<Box<dyn Cursor>, StoreError>> {
        Box::pin(async move {
            let _marker = DropMarker(self.progress.clone());
            self.progress.started.store(true, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let cursor = self.inner.find(filter).await;
            self.progress.finished.store(true, Ordering::SeqCst);
            cursor
        })
    }
}

/// Poll `flag` until it is set or `within` elapses.
pub async fn wait_for(flag: &AtomicBool, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while !flag.load(Ordering::SeqCst) {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    true
}

/// Where a [`FailingStore`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    /// Every collection call fails.
    Everything,
    /// `find` opens, yields `good` documents, then fails mid-iteration.
    CursorAfter { good: usize },
}

/// A store whose backend is unreachable, or whose cursors break part way.
pub struct FailingStore {
    fail_at: FailAt,
    seed: Vec<Document>,
    closes: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            seed: Vec::new(),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many cursors handed out by this store were closed.
    pub fn cursor_closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn with_documents(mut self, documents: Vec<Document>) -> Self {
        self.seed = documents;
        self
    }
}

impl DocumentStore for FailingStore {
    fn collection(&self, database: &str, collection: &str) -> Arc<dyn Collection> {
        Arc::new(FailingCollection {
            namespace: Namespace::new(database, collection),
            fail_at: self.fail_at,
            seed: self.seed.clone(),
            closes: self.closes.clone(),
        })
    }
}

struct FailingCollection {
    namespace: Namespace,
    fail_at: FailAt,
    seed: Vec<Document>,
    closes: Arc<AtomicUsize>,
}

fn unreachable_backend() -> StoreError {
    StoreError::GetObject("connection refused".to_string())
}

impl Collection for FailingCollection {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn insert_one(&self, _document: Document) -> BoxFuture<'_, Result<InsertOneResult, StoreError>> {
        Box::pin(async { Err(StoreError::PutObject("connection refused".to_string())) })
    }

    fn find_one(&self, _filter: Filter) -> BoxFuture<'_, Result<Option<Document>, StoreError>> {
        Box::pin(async { Err(unreachable_backend()) })
    }

    fn update_one(
        &self,
        _filter: Filter,
        _update: Update,
    ) -> BoxFuture<'_, Result<UpdateResult, StoreError>> {
        Box::pin(async { Err(StoreError::PutObject("connection refused".to_string())) })
    }

    fn delete_one(&self, _filter: Filter) -> BoxFuture<'_, Result<DeleteResult, StoreError>> {
        Box::pin(async { Err(StoreError::DeleteObject("connection refused".to_string())) })
    }

    fn find(&self, _filter: Filter) -> BoxFuture<'_, Result<Box<dyn Cursor>, StoreError>> {
        Box::pin(async move {
            match self.fail_at {
                FailAt::Everything => Err(StoreError::ListObjects("connection refused".to_string())),
                FailAt::CursorAfter { good } => Ok(Box::new(BreakingCursor {
                    remaining: self.seed.iter().take(good).cloned().collect(),
                    closes: self.closes.clone(),
                }) as Box<dyn Cursor>),
            }
        })
    }
}

struct BreakingCursor {
    remaining: std::collections::VecDeque<Document>,
    closes: Arc<AtomicUsize>,
}

impl Cursor for BreakingCursor {
    fn next(&mut self) -> BoxFuture<'_, Option<Result<Document, StoreError>>> {
        Box::pin(async move {
            match self.remaining.pop_front() {
                Some(document) => Some(Ok(document)),
                None => Some(Err(StoreError::ListObjects("connection reset".to_string()))),
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closes.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// A template document shaped the way the repository writes them.
pub fn template_document(id: &str, items: &[&str]) -> Document {
    let value = serde_json::json!({
        "id": id,
        "items": items,
        "created": "2024-05-01T12:00:00Z",
        "updated": "2024-05-01T12:00:00Z",
    });
    value.as_object().cloned().expect("object")
}

pub fn items(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: oneshot::Sender<()>,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub async fn client(&self) -> TemplateServiceClient<Channel> {
        TemplateServiceClient::connect(format!("http://{}", self.addr))
            .await
            .expect("connect to test server")
    }
}

/// Start a server on a free loopback port backed by `store`.
pub async fn start_server(store: &dyn DocumentStore) -> TestServer {
    let config = ServerConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        store: StoreBackend::Memory,
        ..ServerConfig::default()
    };

    let server = TemplateServer::bind(&config).await.expect("bind");
    let addr = server.local_addr();
    let api = TemplateApi::new(TemplateRepository::new(store));
    let (shutdown, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.serve(api, async {
        let _ = shutdown_rx.await;
    }));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}
