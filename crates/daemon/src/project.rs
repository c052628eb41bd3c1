// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProjectHost`: the per-project composition of the two sidecar
//! supervisors, the health monitor, the client-facing transport, and the
//! embedding cache. One instance lives in the daemon's `PerProjectRegistry`
//! per project that has ever been touched since the daemon started.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oj_host_adapters::{NixSignaler, SysinfoProcessInspector, TokioSpawner, UnixSidecarClient};
use oj_host_core::{Clock, EmbeddingCache, Event, HealthState, ProjectIdentity, SidecarKind};
use oj_host_engine::{
    Adapters, ComponentProbe, DatabaseProbe, HealthMonitor, HealthMonitorConfig, ResilientTransport, SidecarStatus,
    SidecarSupervisor, SupervisorConfig, TransportConfig,
};
use tokio::sync::Mutex;

use crate::registry::Teardown;

/// The daemon's concrete adapter bundle: real OS-facing implementations
/// for every `SidecarSupervisor` boundary.
#[derive(Clone, Default)]
pub struct RealAdapters {
    signaler: NixSignaler,
    spawner: TokioSpawner,
    client: UnixSidecarClient,
    inspector: SysinfoProcessInspector,
}

impl RealAdapters {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Adapters for RealAdapters {
    type Signaler = NixSignaler;
    type Spawner = TokioSpawner;
    type Client = UnixSidecarClient;
    type Inspector = SysinfoProcessInspector;

    fn signaler(&self) -> Self::Signaler {
        self.signaler
    }

    fn spawner(&self) -> Self::Spawner {
        self.spawner
    }

    fn client(&self) -> Self::Client {
        self.client
    }

    fn inspector(&self) -> Self::Inspector {
        self.inspector.clone()
    }
}

/// Bridges one [`SidecarSupervisor`]'s health check into the
/// [`HealthMonitor`]'s `ComponentProbe` interface. Recovery is advisory: the
/// supervisor's own restart policy is what actually brings the sidecar
/// back, so `recover` here only nudges a cold restart when the monitor has
/// decided the component has been unhealthy too long.
struct SidecarProbe<A: Adapters, C: Clock> {
    name: String,
    supervisor: Arc<SidecarSupervisor<A, C>>,
}

#[async_trait]
impl<A: Adapters, C: Clock + 'static> ComponentProbe for SidecarProbe<A, C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> HealthState {
        let status = self.supervisor.get_status().await;
        if !status.running {
            return HealthState::Unhealthy;
        }
        let result = self.supervisor.health_check().await;
        if result.ok {
            HealthState::Healthy
        } else if status.consecutive_failures > 0 {
            HealthState::Degraded
        } else {
            HealthState::Unhealthy
        }
    }

    async fn recover(&self) -> bool {
        self.supervisor.cold_restart().await
    }
}

/// Bridges the client-facing [`ResilientTransport`] into a probe.
struct TransportProbe<C: Clock> {
    transport: Arc<ResilientTransport<C>>,
}

#[async_trait]
impl<C: Clock + 'static> ComponentProbe for TransportProbe<C> {
    fn name(&self) -> &str {
        "transport"
    }

    async fn probe(&self) -> HealthState {
        use oj_host_engine::TransportState;
        match self.transport.state().await {
            TransportState::Connected => HealthState::Healthy,
            TransportState::Degraded | TransportState::Recovering => HealthState::Degraded,
            TransportState::Initializing => HealthState::Unknown,
            TransportState::Disconnecting | TransportState::Disconnected => HealthState::Unhealthy,
        }
    }
}

pub use oj_host_engine::DatabasePool;

/// Everything the daemon manages for one project: the embedding and CoT
/// sidecar supervisors, the composite health monitor over both plus the
/// client transport, and the embedding cache.
pub struct ProjectHost<C: Clock> {
    pub identity: ProjectIdentity,
    pub embedding: Arc<SidecarSupervisor<RealAdapters, C>>,
    pub cot: Arc<SidecarSupervisor<RealAdapters, C>>,
    pub health: Arc<HealthMonitor>,
    pub transport: Arc<ResilientTransport<C>>,
    pub cache: Mutex<EmbeddingCache>,
    health_stop: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

impl<C: Clock + 'static> ProjectHost<C> {
    pub async fn new(
        identity: ProjectIdentity,
        clock: C,
        events: tokio::sync::mpsc::Sender<Event>,
        database: Option<Arc<dyn DatabasePool>>,
    ) -> Arc<Self> {
        let adapters = RealAdapters::new();

        let embedding = SidecarSupervisor::new(
            identity.clone(),
            SidecarKind::Embedding,
            SupervisorConfig::from_env("OJ_EMBEDDING", SidecarKind::Embedding),
            adapters.clone(),
            clock.clone(),
        )
        .with_events(events.clone());

        let cot = SidecarSupervisor::new(
            identity.clone(),
            SidecarKind::CoT,
            SupervisorConfig::from_env("OJ_MINICOT", SidecarKind::CoT),
            adapters,
            clock.clone(),
        )
        .with_events(events.clone());

        let transport = Arc::new(
            ResilientTransport::new("client_transport", TransportConfig::from_env("OJ_TRANSPORT"), clock.clone())
                .with_events(events.clone()),
        );

        let health = HealthMonitor::new(HealthMonitorConfig::from_env("OJ_HEALTH"), {
            let clock = clock.clone();
            move || clock.now_ms()
        })
        .with_events(events);

        health
            .add_probe(Arc::new(SidecarProbe { name: "embedding".to_string(), supervisor: Arc::clone(&embedding) }))
            .await;
        health
            .add_probe(Arc::new(SidecarProbe { name: "cot".to_string(), supervisor: Arc::clone(&cot) }))
            .await;
        health.add_probe(Arc::new(TransportProbe { transport: Arc::clone(&transport) })).await;
        if let Some(pool) = database {
            health.add_probe(Arc::new(DatabaseProbe::new(pool))).await;
        }

        Arc::new(Self {
            identity,
            embedding,
            cot,
            health,
            transport,
            cache: Mutex::new(EmbeddingCache::default()),
            health_stop: Mutex::new(None),
        })
    }

    /// Bring both sidecars up and start the health monitor's recursive
    /// scheduling loop as a detached task.
    pub async fn start(self: &Arc<Self>) {
        self.embedding.initialize().await;
        self.cot.initialize().await;

        let (tx, rx) = tokio::sync::oneshot::channel();
        *self.health_stop.lock().await = Some(tx);
        let health = Arc::clone(&self.health);
        tokio::spawn(async move {
            health.run_until(rx).await;
        });
    }

    pub async fn aggregate_health(&self) -> HealthState {
        self.health.aggregate().await
    }

    pub async fn embedding_status(&self) -> SidecarStatus {
        self.embedding.get_status().await
    }

    pub async fn cot_status(&self) -> SidecarStatus {
        self.cot.get_status().await
    }

    /// Reinitialise C4-C6 in response to a peer's reload broadcast, without
    /// restarting this host process: cold-restart both sidecars and take an
    /// immediate health tick so the aggregate reflects the new state.
    pub async fn reload(self: &Arc<Self>) {
        self.embedding.cold_restart().await;
        self.cot.cold_restart().await;
        self.health.tick().await;
    }
}

impl<C: Clock + 'static> Teardown for ProjectHost<C> {
    fn shutdown(self: Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            if let Some(stop) = self.health_stop.lock().await.take() {
                let _ = stop.send(());
            }
            self.transport.shutdown().await;
            self.embedding.shutdown().await;
            self.cot.shutdown().await;
        })
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
