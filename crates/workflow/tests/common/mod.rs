#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gigsync_core::platform::{
    FreelancerProfile, PlatformCategory, PlatformError, PlatformMetadata, PlatformModule,
    PlatformSession, RemoteAccount,
};
use gigsync_core::registry::PlatformRegistry;
use gigsync_core::types::{ConfigBlob, EntityId, OrgId};
use gigsync_db::models::{ConfigPatch, CreateFreelancer, FreelancerPlatformAssociation};
use gigsync_db::repositories::{AssociationRepo, FreelancerRepo};
use gigsync_db::{
    ChangeScope, Filter, MemoryStore, RecordStore, StoreError, Subscription, Table,
};
use gigsync_events::EventBus;
use gigsync_workflow::{WorkflowConfig, WorkflowEngine};
use serde_json::{json, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fake platform module
// ---------------------------------------------------------------------------

/// Tracks how many remote calls run at once across every fake module.
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Call counters and injectable failures shared by a module and its sessions.
#[derive(Default)]
pub struct FakeState {
    pub initialize_calls: AtomicUsize,
    pub test_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub initialize_error: Mutex<Option<PlatformError>>,
    pub test_error: Mutex<Option<PlatformError>>,
    pub create_error: Mutex<Option<PlatformError>>,
    pub update_error: Mutex<Option<PlatformError>>,
    pub delete_error: Mutex<Option<PlatformError>>,
    pub create_delay: Mutex<Duration>,
}

fn injected(slot: &Mutex<Option<PlatformError>>) -> Result<(), PlatformError> {
    match slot.lock().unwrap().clone() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

pub struct FakeModule {
    metadata: PlatformMetadata,
    pub state: Arc<FakeState>,
    gauge: Arc<Gauge>,
}

impl FakeModule {
    pub fn new(id: &str, gauge: Arc<Gauge>) -> Self {
        Self {
            metadata: PlatformMetadata {
                id: id.to_string(),
                display_name: id.to_uppercase(),
                category: PlatformCategory::Other,
                requires_auth: true,
                description: format!("fake {id}"),
            },
            state: Arc::new(FakeState::default()),
            gauge,
        }
    }

    pub fn creates(&self) -> usize {
        self.state.create_calls.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.state.delete_calls.load(Ordering::SeqCst)
    }

    pub fn initializes(&self) -> usize {
        self.state.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.state.update_calls.load(Ordering::SeqCst)
    }

    pub fn fail_initialize(&self, error: PlatformError) {
        *self.state.initialize_error.lock().unwrap() = Some(error);
    }

    pub fn fail_test(&self, error: PlatformError) {
        *self.state.test_error.lock().unwrap() = Some(error);
    }

    pub fn fail_create(&self, error: PlatformError) {
        *self.state.create_error.lock().unwrap() = Some(error);
    }

    pub fn fail_update(&self, error: PlatformError) {
        *self.state.update_error.lock().unwrap() = Some(error);
    }

    pub fn fail_delete(&self, error: PlatformError) {
        *self.state.delete_error.lock().unwrap() = Some(error);
    }

    pub fn heal(&self) {
        *self.state.initialize_error.lock().unwrap() = None;
        *self.state.test_error.lock().unwrap() = None;
        *self.state.create_error.lock().unwrap() = None;
        *self.state.update_error.lock().unwrap() = None;
        *self.state.delete_error.lock().unwrap() = None;
    }

    pub fn delay_create(&self, delay: Duration) {
        *self.state.create_delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl PlatformModule for FakeModule {
    fn metadata(&self) -> &PlatformMetadata {
        &self.metadata
    }

    fn required_config_fields(&self) -> &[&'static str] {
        &["token"]
    }

    async fn initialize(
        &self,
        _config: &ConfigBlob,
    ) -> Result<Box<dyn PlatformSession>, PlatformError> {
        self.state.initialize_calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.state.initialize_error)?;
        Ok(Box::new(FakeSession {
            platform: self.metadata.id.clone(),
            state: Arc::clone(&self.state),
            gauge: Arc::clone(&self.gauge),
        }))
    }
}

struct FakeSession {
    platform: String,
    state: Arc<FakeState>,
    gauge: Arc<Gauge>,
}

#[async_trait]
impl PlatformSession for FakeSession {
    async fn test_connection(&self) -> Result<(), PlatformError> {
        self.state.test_calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.state.test_error)
    }

    async fn create_user(&self, profile: &FreelancerProfile) -> Result<RemoteAccount, PlatformError> {
        let n = self.state.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.enter();
        let delay = *self.state.create_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        self.gauge.exit();
        injected(&self.state.create_error)?;
        Ok(RemoteAccount {
            remote_id: format!("{}-{n}", self.platform),
            email: profile.email.clone(),
            display_name: profile.full_name.clone(),
            profile_url: None,
            created_at: None,
        })
    }

    async fn update_user(&self, _remote_id: &str, _profile: &FreelancerProfile) -> Result<(), PlatformError> {
        self.state.update_calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.state.update_error)
    }

    async fn delete_user(&self, _remote_id: &str) -> Result<(), PlatformError> {
        self.state.delete_calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.state.delete_error)
    }

    async fn get_user(&self, remote_id: &str) -> Result<RemoteAccount, PlatformError> {
        Err(PlatformError::NotFound(remote_id.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<RemoteAccount>, PlatformError> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Store that can be switched into an outage
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.select(table, filter).await
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.insert(table, row).await
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> Result<Vec<Value>, StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.update(table, filter, patch).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.delete(table, filter).await
    }

    fn subscribe(&self, scope: ChangeScope) -> Subscription {
        self.inner.subscribe(scope)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub engine: Arc<WorkflowEngine>,
    pub bus: Arc<EventBus>,
    pub org: OrgId,
    pub gauge: Arc<Gauge>,
    modules: HashMap<String, Arc<FakeModule>>,
}

impl Harness {
    /// Engine with one fake module per id, nothing configured yet.
    pub fn new(platforms: &[&str]) -> Self {
        Self::with_config(platforms, WorkflowConfig::default())
    }

    pub fn with_config(platforms: &[&str], config: WorkflowConfig) -> Self {
        let gauge = Arc::new(Gauge::default());
        let mut registry = PlatformRegistry::new();
        let mut modules = HashMap::new();
        for id in platforms {
            let module = Arc::new(FakeModule::new(id, Arc::clone(&gauge)));
            registry.register(module.clone()).unwrap();
            modules.insert(id.to_string(), module);
        }

        let store = Arc::new(FlakyStore::default());
        let bus = Arc::new(EventBus::default());
        let engine = Arc::new(WorkflowEngine::new(
            store.clone(),
            Arc::new(registry),
            Arc::clone(&bus),
            config,
        ));
        Self {
            store,
            engine,
            bus,
            org: Uuid::now_v7(),
            gauge,
            modules,
        }
    }

    pub fn module(&self, id: &str) -> &Arc<FakeModule> {
        &self.modules[id]
    }

    pub async fn freelancer(&self, name: &str) -> EntityId {
        FreelancerRepo::create(
            self.store.as_ref(),
            &CreateFreelancer {
                organization_id: self.org,
                full_name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                headline: None,
                skills: vec!["editing".into()],
                country: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    /// Save a valid config, which also enables the platform.
    pub async fn enable(&self, platform: &str) {
        self.engine
            .configurations()
            .upsert(
                self.org,
                platform,
                ConfigPatch {
                    enabled: None,
                    config: json!({"token": format!("{platform}-token")}).as_object().cloned(),
                },
            )
            .await
            .unwrap();
    }

    pub async fn disable(&self, platform: &str) {
        self.engine
            .configurations()
            .set_enabled(self.org, platform, false)
            .await
            .unwrap();
    }

    pub async fn association(&self, entity: EntityId, platform: &str) -> Option<FreelancerPlatformAssociation> {
        AssociationRepo::find(self.store.as_ref(), entity, platform)
            .await
            .unwrap()
    }

    /// Raw row count for one pair, bypassing the repository's single-row view.
    pub async fn association_rows(&self, entity: EntityId, platform: &str) -> usize {
        self.store
            .inner
            .select(
                Table::FreelancerPlatforms,
                &Filter::all()
                    .eq("freelancer_id", entity)
                    .eq("platform_id", platform),
            )
            .await
            .unwrap()
            .len()
    }

    pub async fn freelancer_status(&self, entity: EntityId) -> gigsync_core::status::FreelancerStatus {
        FreelancerRepo::find_by_id(self.store.as_ref(), entity)
            .await
            .unwrap()
            .unwrap()
            .status
    }
}

pub fn ids(platforms: &[&str]) -> Vec<String> {
    platforms.iter().map(|p| p.to_string()).collect()
}
