//! Dependency initialization and wiring for the persistor.

use std::sync::Arc;

use persistor_repository::{DocumentStoreService, OpenSearchTransport};
use tracing::info;

use super::{BusKind, PersistorConfig};
use crate::bus::{KafkaBus, LocalBus};
use crate::dispatcher::Dispatcher;
use crate::orchestrator::Orchestrator;
use crate::PersistorError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// Publisher for the in-process bus, when that bus is selected.
    pub local_bus: Option<LocalBus>,
}

impl Dependencies {
    /// Wire transport, service, dispatcher, bus and orchestrator.
    ///
    /// No network call is made here; startup indices are ensured when the
    /// orchestrator runs.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(PersistorError)` - If the transport or bus cannot be created
    pub fn new(config: &PersistorConfig) -> Result<Self, PersistorError> {
        info!(
            host = %config.host,
            port = config.port,
            address = %config.address,
            bus = ?config.bus.kind,
            indices = config.indices.len(),
            "Initializing dependencies"
        );

        let transport = OpenSearchTransport::new(&config.transport())?;
        let service = DocumentStoreService::new(Arc::new(transport));
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(service)));

        let (orchestrator, local_bus) = match config.bus.kind {
            BusKind::Kafka => {
                let bus = KafkaBus::new(&config.bus.kafka(), &config.address)?;
                bus.subscribe()?;
                info!("Kafka bus created");
                (Orchestrator::new(bus, dispatcher), None)
            }
            BusKind::Local => {
                let (bus, receiver) = LocalBus::new(&config.address);
                info!("Local bus created");
                (Orchestrator::new(receiver, dispatcher), Some(bus))
            }
        };

        Ok(Self {
            orchestrator: orchestrator.with_indices(config.indices.clone()),
            local_bus,
        })
    }
}
