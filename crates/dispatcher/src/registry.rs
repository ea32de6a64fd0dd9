//! Process-wide transport cache with single-flight construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use contracts::{QueueTransport, SinkError, TransportFactory, TransportKind};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::transports::{FileTransport, LogTransport, NetworkTransport};

type TransportCell = Arc<OnceCell<Arc<dyn QueueTransport>>>;

/// Cache of constructed transports keyed by kind
///
/// Owned by the long-lived service context and passed by reference into every
/// dispatcher. Concurrent resolves of the same unresolved kind share one
/// construction; a failed construction leaves the slot empty so a later
/// resolve retries.
pub struct AdapterRegistry {
    factory: Arc<dyn TransportFactory>,
    cells: Mutex<HashMap<TransportKind, TransportCell>>,
}

impl AdapterRegistry {
    /// Create a registry around the given factory
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            factory,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry building the bundled transports
    pub fn with_default_factory() -> Self {
        Self::new(Arc::new(DefaultTransportFactory))
    }

    /// Resolve the transport for `kind`, constructing and caching on first use
    ///
    /// # Errors
    /// Propagates the factory's construction error.
    #[instrument(name = "registry_resolve", skip(self, params), fields(kind = %kind))]
    pub async fn resolve(
        &self,
        kind: TransportKind,
        params: &HashMap<String, String>,
    ) -> Result<Arc<dyn QueueTransport>, SinkError> {
        let cell = Arc::clone(self.cells().entry(kind).or_default());

        let transport = cell
            .get_or_try_init(|| async {
                debug!(kind = %kind, "constructing queue transport");
                self.factory.build(kind, params).await
            })
            .await?;

        Ok(Arc::clone(transport))
    }

    /// Whether a transport for `kind` has already been constructed
    pub fn is_resolved(&self, kind: TransportKind) -> bool {
        self.cells()
            .get(&kind)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<TransportKind, TransportCell>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builds the bundled transports
pub struct DefaultTransportFactory;

#[async_trait]
impl TransportFactory for DefaultTransportFactory {
    async fn build(
        &self,
        kind: TransportKind,
        params: &HashMap<String, String>,
    ) -> Result<Arc<dyn QueueTransport>, SinkError> {
        match kind {
            TransportKind::Log => Ok(Arc::new(LogTransport::new("log"))),
            TransportKind::File => Ok(Arc::new(FileTransport::from_params("file", params)?)),
            TransportKind::Network => {
                Ok(Arc::new(NetworkTransport::from_params("network", params).await?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PushReceipt;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct NoopTransport;

    #[async_trait]
    impl QueueTransport for NoopTransport {
        fn name(&self) -> &str {
            "noop"
        }

        async fn push(&self, _event: Value) -> Result<PushReceipt, SinkError> {
            Ok(PushReceipt::default())
        }
    }

    /// Factory that counts constructions and holds to widen the race window
    struct CountingFactory {
        built: AtomicU32,
        fail_first: AtomicU32,
    }

    #[async_trait]
    impl TransportFactory for CountingFactory {
        async fn build(
            &self,
            _kind: TransportKind,
            _params: &HashMap<String, String>,
        ) -> Result<Arc<dyn QueueTransport>, SinkError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.built.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n > 0).then(|| n - 1)
            })
            .is_ok()
            {
                return Err(SinkError::transport_init("noop", "mock failure"));
            }
            Ok(Arc::new(NoopTransport))
        }
    }

    fn counting_registry(fail_first: u32) -> (AdapterRegistry, Arc<CountingFactory>) {
        let factory = Arc::new(CountingFactory {
            built: AtomicU32::new(0),
            fail_first: AtomicU32::new(fail_first),
        });
        (AdapterRegistry::new(Arc::clone(&factory) as _), factory)
    }

    #[tokio::test]
    async fn test_concurrent_resolves_construct_once() {
        let (registry, factory) = counting_registry(0);
        let params = HashMap::new();

        let (a, b) = tokio::join!(
            registry.resolve(TransportKind::Log, &params),
            registry.resolve(TransportKind::Log, &params)
        );

        let a = a.unwrap();
        let b = b.unwrap();
        assert_eq!(factory.built.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.is_resolved(TransportKind::Log));
    }

    #[tokio::test]
    async fn test_cached_instance_is_reused() {
        let (registry, factory) = counting_registry(0);
        let params = HashMap::new();

        registry.resolve(TransportKind::Log, &params).await.unwrap();
        registry.resolve(TransportKind::Log, &params).await.unwrap();

        assert_eq!(factory.built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_construction_retries() {
        let (registry, factory) = counting_registry(1);
        let params = HashMap::new();

        let first = registry.resolve(TransportKind::Log, &params).await;
        assert!(first.is_err());
        assert!(!registry.is_resolved(TransportKind::Log));

        let second = registry.resolve(TransportKind::Log, &params).await;
        assert!(second.is_ok());
        assert_eq!(factory.built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_kinds_are_cached_separately() {
        let (registry, factory) = counting_registry(0);
        let params = HashMap::new();

        registry.resolve(TransportKind::Log, &params).await.unwrap();
        registry.resolve(TransportKind::File, &params).await.unwrap();

        assert_eq!(factory.built.load(Ordering::SeqCst), 2);
    }
}
