//! Shared fixtures for the integration tests.

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use wot_telemetry::{init_logging, LoggingGuard, TelemetryConfig};
use wot_updater::{
    InMemoryIdentityCache, IdentityId, JobHandle, RecordingConnector, TrustRecord, TrustScore,
    TrustUpdater, TrustUpdaterApi, UpdateJob, UpdaterConfig,
};

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// Identity used to hold the worker busy in [`Harness::parked`].
pub const PARKING_IDENTITY: &str = "parking-identity";

/// Coordinator type used throughout the suite.
pub type TestUpdater = TrustUpdater<RecordingConnector, InMemoryIdentityCache>;

static LOGGING: OnceLock<Option<LoggingGuard>> = OnceLock::new();

/// Installs the log subscriber once per test binary.
pub fn init_test_logging() {
    LOGGING.get_or_init(|| {
        let config = TelemetryConfig {
            log_level: std::env::var("WOT_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            ..TelemetryConfig::default()
        };
        init_logging(&config).ok()
    });
}

pub fn id(name: &str) -> IdentityId {
    IdentityId::from(name)
}

pub fn score(value: i32) -> TrustScore {
    TrustScore::new(value).expect("score in range")
}

/// Polls `condition` until it holds or [`WAIT`] passes.
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Coordinator wired to a recording connector and an in-memory cache.
pub struct Harness {
    pub connector: Arc<RecordingConnector>,
    pub identities: Arc<InMemoryIdentityCache>,
    pub updater: TestUpdater,
}

impl Harness {
    pub fn new() -> Self {
        Self::from_parts(
            RecordingConnector::new(),
            Arc::new(InMemoryIdentityCache::new()),
            UpdaterConfig::default(),
        )
    }

    pub fn with_config(config: UpdaterConfig) -> Self {
        Self::from_parts(
            RecordingConnector::new(),
            Arc::new(InMemoryIdentityCache::new()),
            config,
        )
    }

    pub fn from_parts(
        connector: RecordingConnector,
        identities: Arc<InMemoryIdentityCache>,
        config: UpdaterConfig,
    ) -> Self {
        init_test_logging();
        let connector = Arc::new(connector);
        let updater = TrustUpdater::new(config, Arc::clone(&connector), Arc::clone(&identities))
            .expect("valid config");
        Self {
            connector,
            identities,
            updater,
        }
    }

    /// Starts the worker.
    pub fn started() -> Self {
        let harness = Self::new();
        harness.updater.start().expect("worker starts");
        harness
    }

    /// Starts the worker and holds it inside a connector call, so that
    /// everything submitted afterwards stays queued until [`Self::release`].
    pub fn park(&self) -> JobHandle {
        self.connector.close_gate();
        if self.updater.start().is_err() {
            panic!("worker already started");
        }
        let blocker = self.updater.submit(UpdateJob::AddContext {
            own_identity: id(PARKING_IDENTITY),
            context: "parked".to_string(),
        });
        assert!(self.connector.wait_for_calls(1, WAIT), "worker never picked up the blocker");
        blocker
    }

    /// Lets the parked worker continue.
    pub fn release(&self) {
        self.connector.open_gate();
    }

    /// Connector calls, minus the parking blocker.
    pub fn backend_calls(&self) -> Vec<wot_updater::ConnectorCall> {
        self.connector
            .calls()
            .into_iter()
            .filter(|call| {
                !matches!(call, wot_updater::ConnectorCall::AddContext { own_identity, .. }
                    if own_identity.as_str() == PARKING_IDENTITY)
            })
            .collect()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Trust records observed in the cache at the moment the connector was called.
pub type TrustSnapshots = Arc<Mutex<Vec<Option<TrustRecord>>>>;

/// Connector whose trust calls snapshot the cached trust for the same pair.
pub fn trust_snapshot_connector(
    identities: Arc<InMemoryIdentityCache>,
) -> (RecordingConnector, TrustSnapshots) {
    let snapshots: TrustSnapshots = Arc::default();
    let seen = Arc::clone(&snapshots);
    let connector = RecordingConnector::with_hook(move |call| match call {
        wot_updater::ConnectorCall::SetTrust { truster, trustee, .. }
        | wot_updater::ConnectorCall::RemoveTrust { truster, trustee } => {
            seen.lock().push(identities.trust(truster, trustee));
        }
        _ => {}
    });
    (connector, snapshots)
}
