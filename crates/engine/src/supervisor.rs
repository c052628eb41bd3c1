// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SidecarSupervisor`: start/stop/restart lifecycle for one sidecar
//! (embedding or CoT) in one project.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use oj_host_adapters::{
    process_inspector::{Ownership, ProcessInspector},
    sidecar_client::{self, SidecarClient, SidecarClientError},
    signal::{ProcessSignaler, Signal},
    spawn::{LaunchRecipe, ProcessSpawner, SpawnedChild},
    FileLockError,
};
use oj_host_core::{config, Clock, Event, ProjectIdentity, SidecarKind};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::recovery::{self, RestartPolicy, RestartState};

/// Bundles the adapters a supervisor needs behind one generic parameter,
/// mirroring the host's `Adapters: Clone + Send + Sync` bundling pattern.
pub trait Adapters: Clone + Send + Sync + 'static {
    type Signaler: ProcessSignaler;
    type Spawner: ProcessSpawner;
    type Client: SidecarClient;
    type Inspector: ProcessInspector;

    fn signaler(&self) -> Self::Signaler;
    fn spawner(&self) -> Self::Spawner;
    fn client(&self) -> Self::Client;
    fn inspector(&self) -> Self::Inspector;
}

/// Tunables for one [`SidecarSupervisor`], read from the environment under a
/// caller-chosen prefix (e.g. `OJ_EMBEDDING` or `OJ_MINICOT`).
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub startup_timeout: Duration,
    pub health_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub max_failures: u32,
    pub kill_stale: bool,
    pub max_process_age_hours: f64,
    pub auto_start: bool,
    pub restart_policy: RestartPolicy,
    pub pending_queue_cap: usize,
    pub pending_request_ttl: Duration,
    pub bound_socket_env_var: String,
}

impl SupervisorConfig {
    pub fn from_env(prefix: &str, kind: SidecarKind) -> Self {
        let default_startup = match kind {
            SidecarKind::Embedding => Duration::from_secs(45),
            SidecarKind::CoT => Duration::from_secs(60),
        };
        Self {
            startup_timeout: config::duration_secs_env(prefix, "STARTUP_TIMEOUT", default_startup),
            health_timeout: config::duration_secs_env(prefix, "TIMEOUT", Duration::from_secs(5)),
            heartbeat_interval: config::duration_secs_env(prefix, "HEALTH_INTERVAL", Duration::from_secs(25)),
            max_failures: config::usize_env(prefix, "MAX_FAILURES", 3) as u32,
            kill_stale: config::bool_env(prefix, "KILL_STALE", true),
            max_process_age_hours: config::usize_env(prefix, "MAX_AGE_HOURS", 24) as f64,
            auto_start: config::bool_env(prefix, "AUTO_START", true),
            restart_policy: RestartPolicy::from_env(prefix, 5),
            pending_queue_cap: 100,
            pending_request_ttl: Duration::from_secs(5 * 60),
            bound_socket_env_var: format!("{prefix}_EMBEDDING_SOCKET"),
        }
    }
}

/// Lifecycle state, mirroring spec.md's managed-case state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LifecycleState {
    Idle,
    Starting,
    Running { managed: bool, pid: Option<u32> },
    Stopping,
}

/// A point-in-time snapshot of supervisor state for callers (`getStatus()`).
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarStatus {
    pub running: bool,
    pub managed: bool,
    pub pid: Option<u32>,
    pub consecutive_failures: u32,
    pub restart_count: u32,
    pub user_stopped: bool,
}

struct PendingRequest {
    payload: Value,
    enqueued_at_ms: u64,
    responder: oneshot::Sender<Result<Value, SidecarClientError>>,
}

struct Inner {
    lifecycle: LifecycleState,
    consecutive_failures: u32,
    restart_state: RestartState,
    pending: VecDeque<PendingRequest>,
    draining: bool,
    queue_dropped_count: u64,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleState::Idle,
            consecutive_failures: 0,
            restart_state: RestartState::default(),
            pending: VecDeque::new(),
            draining: false,
            queue_dropped_count: 0,
        }
    }
}

/// Supervises one sidecar process for one project: starting it, watching
/// its health, restarting it on unexpected exit, and (for the CoT sidecar)
/// queuing requests while it is unavailable.
pub struct SidecarSupervisor<A: Adapters, C: Clock> {
    identity: ProjectIdentity,
    kind: SidecarKind,
    config: SupervisorConfig,
    adapters: A,
    clock: C,
    events: Option<mpsc::Sender<Event>>,
    inner: Mutex<Inner>,
    child: Mutex<Option<<A::Spawner as ProcessSpawner>::Child>>,
    in_mem_start_guard: AtomicBool,
    /// Set just before any deliberate stop (`stop`/`user_stop`/`cold_restart`)
    /// signals the child, consumed by the exit watcher so a stop-induced
    /// exit is never mistaken for a crash and restarted.
    expected_exit: AtomicBool,
}

impl<A: Adapters, C: Clock + 'static> SidecarSupervisor<A, C> {
    pub fn new(identity: ProjectIdentity, kind: SidecarKind, config: SupervisorConfig, adapters: A, clock: C) -> Arc<Self> {
        Arc::new(Self {
            identity,
            kind,
            config,
            adapters,
            clock,
            events: None,
            inner: Mutex::new(Inner::default()),
            child: Mutex::new(None),
            in_mem_start_guard: AtomicBool::new(false),
            expected_exit: AtomicBool::new(false),
        })
    }

    pub fn with_events(mut self: Arc<Self>, tx: mpsc::Sender<Event>) -> Arc<Self> {
        if let Some(inner) = Arc::get_mut(&mut self) {
            inner.events = Some(tx);
        }
        self
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// §4.4.3: kill stale/orphan processes from a prior run, then start.
    pub async fn initialize(self: &Arc<Self>) -> bool {
        if self.config.kill_stale {
            self.kill_stale_on_start().await;
        }
        self.start().await
    }

    async fn kill_stale_on_start(&self) {
        let pid_path = self.identity.pid_path(self.kind);
        let Ok(contents) = std::fs::read_to_string(&pid_path) else {
            return;
        };
        let Some((pid_str, _)) = contents.trim().split_once(':') else {
            let _ = std::fs::remove_file(&pid_path);
            return;
        };
        let Ok(pid) = pid_str.parse::<u32>() else {
            let _ = std::fs::remove_file(&pid_path);
            return;
        };

        let inspector = self.adapters.inspector();
        let expected_socket = self.identity.socket_path(self.kind).to_string_lossy().to_string();
        let ownership = inspector
            .classify_ownership(pid, &self.config.bound_socket_env_var, &expected_socket)
            .await;

        if ownership == Ownership::OwnedByOtherProject {
            debug!(pid, "stale pid belongs to another project, leaving alone");
            return;
        }
        if !inspector.is_alive(pid).await {
            let _ = std::fs::remove_file(&pid_path);
            return;
        }

        let age_hours = inspector.process_start_age_hours(pid).await.unwrap_or(0.0);
        if age_hours > self.config.max_process_age_hours && ownership == Ownership::Unknown {
            debug!(pid, age_hours, "preserving old process of unconfirmed ownership");
            return;
        }

        let signaler = self.adapters.signaler();
        let _ = signaler.send(pid, Signal::Term).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        if inspector.is_alive(pid).await {
            let _ = signaler.send(pid, Signal::Kill).await;
        }
        let _ = std::fs::remove_file(&pid_path);
        let _ = std::fs::remove_file(self.identity.socket_path(self.kind));
    }

    fn user_stopped(&self) -> bool {
        self.identity.stopped_flag_path(self.kind).exists()
    }

    /// §4.4.1: the start protocol.
    pub async fn start(self: &Arc<Self>) -> bool {
        {
            let inner = self.inner.lock().await;
            if let LifecycleState::Running { .. } = inner.lifecycle {
                return true;
            }
            if inner.lifecycle == LifecycleState::Stopping {
                return false;
            }
        }
        if self.in_mem_start_guard.swap(true, Ordering::SeqCst) {
            return false;
        }

        let result = self.start_inner().await;
        self.in_mem_start_guard.store(false, Ordering::SeqCst);
        if !result {
            self.stop().await;
        }
        result
    }

    async fn start_inner(self: &Arc<Self>) -> bool {
        {
            let mut inner = self.inner.lock().await;
            inner.lifecycle = LifecycleState::Starting;
        }

        if let Err(e) = self.identity.ensure_socket_dir() {
            warn!(error = %e, "could not ensure socket dir");
            return false;
        }

        let lock_path = self.identity.start_lock_path(self.kind);
        let now = self.now_ms();
        let pid = std::process::id();
        match oj_host_adapters::file_lock::try_acquire(&lock_path, Duration::from_secs(60), now, pid) {
            Ok(()) => {}
            Err(FileLockError::Held(_)) => {
                if self.wait_for_peer_start().await {
                    return true;
                }
                return false;
            }
            Err(e) => {
                warn!(error = %e, "start lock I/O error");
                return false;
            }
        }

        let started = self.start_under_lock().await;
        let _ = oj_host_adapters::file_lock::release(&lock_path);
        started
    }

    /// §4.4.1 step 4 fallback: poll up to 30s for a peer-started socket.
    async fn wait_for_peer_start(&self) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
        let socket_path = self.identity.socket_path(self.kind);
        while tokio::time::Instant::now() < deadline {
            if socket_path.exists() && self.probe_health().await.0 {
                return true;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        false
    }

    async fn start_under_lock(self: &Arc<Self>) -> bool {
        let socket_path = self.identity.socket_path(self.kind);

        if socket_path.exists() {
            if self.probe_health().await.0 {
                let mut inner = self.inner.lock().await;
                inner.lifecycle = LifecycleState::Running { managed: false, pid: None };
                drop(inner);
                self.emit(Event::Started { kind: self.kind, pid: None, external: true });
                self.spawn_heartbeat_if_embedding();
                return true;
            }
            let _ = std::fs::remove_file(&socket_path);
        }

        let recipe = self.launch_recipe();
        let spawner = self.adapters.spawner();
        let mut child = match spawner.spawn(&recipe).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to spawn sidecar");
                return false;
            }
        };
        let pid = child.pid();

        if let Err(e) = std::fs::write(self.identity.pid_path(self.kind), format!("{}:{}", pid, self.now_ms())) {
            warn!(error = %e, "failed to write pid file");
        }

        if !self.wait_for_socket_ready().await {
            let _ = child.wait().await;
            return false;
        }

        let (ok, _) = self.probe_health().await;
        if !ok {
            return false;
        }

        {
            let mut inner = self.inner.lock().await;
            inner.lifecycle = LifecycleState::Running { managed: true, pid: Some(pid) };
            inner.consecutive_failures = 0;
        }
        self.emit(Event::Started { kind: self.kind, pid: Some(pid), external: false });
        self.spawn_heartbeat_if_embedding();

        self.expected_exit.store(false, Ordering::SeqCst);
        *self.child.lock().await = Some(child);
        self.spawn_exit_watcher();

        self.drain_pending_queue().await;
        true
    }

    fn launch_recipe(&self) -> LaunchRecipe {
        let socket_dir = self.identity.socket_dir();
        LaunchRecipe {
            program: "python3".to_string(),
            args: vec![self.kind.stem().to_string()],
            cwd: Some(self.identity.root().to_path_buf()),
            env: vec![
                ("OJ_SOCKET_DIR".to_string(), socket_dir.to_string_lossy().to_string()),
                (self.config.bound_socket_env_var.clone(), self.identity.socket_path(self.kind).to_string_lossy().to_string()),
            ],
        }
    }

    /// §4.4.2: two-phase socket-ready wait under one overall deadline.
    async fn wait_for_socket_ready(&self) -> bool {
        let total = self.config.startup_timeout;
        let phase_a_deadline = tokio::time::Instant::now() + total / 2;
        let socket_path = self.identity.socket_path(self.kind);

        while tokio::time::Instant::now() < phase_a_deadline {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        if !socket_path.exists() {
            return false;
        }

        let overall_deadline = tokio::time::Instant::now() + total / 2;
        let probe_interval = Duration::from_secs(1);
        loop {
            let remaining = overall_deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining < probe_interval {
                return false;
            }
            if self.probe_health().await.0 {
                return true;
            }
            tokio::time::sleep(probe_interval).await;
        }
    }

    fn spawn_heartbeat_if_embedding(self: &Arc<Self>) {
        if self.kind != SidecarKind::Embedding {
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.heartbeat_loop().await;
        });
    }

    async fn heartbeat_loop(self: Arc<Self>) {
        loop {
            tokio::time::sleep(self.config.heartbeat_interval).await;
            {
                let inner = self.inner.lock().await;
                if !matches!(inner.lifecycle, LifecycleState::Running { .. }) {
                    return;
                }
            }
            let client = self.adapters.client();
            let req = sidecar_client::embedding_keepalive_request("heartbeat");
            let result = client.request(&self.identity.socket_path(self.kind), req, Duration::from_secs(5)).await;
            if let Err(e) = result {
                debug!(error = %e, "heartbeat failed, continuing");
            }
        }
    }

    fn spawn_exit_watcher(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.watch_for_exit().await;
        });
    }

    async fn watch_for_exit(self: Arc<Self>) {
        let mut child = {
            let mut guard = self.child.lock().await;
            match guard.take() {
                Some(child) => child,
                None => return,
            }
        };
        let exit_code = child.wait().await.ok().flatten();
        debug!(?exit_code, kind = ?self.kind, "sidecar child exited");
        self.on_unexpected_exit().await;
    }

    /// §4.4.5: restart policy and loop detection on unexpected exit.
    async fn on_unexpected_exit(self: &Arc<Self>) {
        if self.expected_exit.swap(false, Ordering::SeqCst) {
            let mut inner = self.inner.lock().await;
            inner.lifecycle = LifecycleState::Idle;
            return;
        }

        if self.user_stopped() {
            let mut inner = self.inner.lock().await;
            inner.lifecycle = LifecycleState::Idle;
            return;
        }

        if self.kind == SidecarKind::Embedding && self.check_kys_auto_respawn().await {
            return;
        }

        let now = self.now_ms();
        let decision = {
            let inner = self.inner.lock().await;
            recovery::decide(&inner.restart_state, &self.config.restart_policy, now)
        };

        match decision {
            recovery::RestartDecision::GiveUp => {
                self.emit(Event::RestartFailed { kind: self.kind, attempt: self.config.restart_policy.max_attempts, reason: "max restart attempts reached".to_string() });
                let mut inner = self.inner.lock().await;
                inner.lifecycle = LifecycleState::Idle;
            }
            recovery::RestartDecision::LoopBackoff { backoff } => {
                let attempts = {
                    let inner = self.inner.lock().await;
                    inner.restart_state.restarts_in_last_60s(now)
                };
                self.emit(Event::RestartLoop { kind: self.kind, attempts });
                tokio::time::sleep(backoff).await;
                self.record_and_restart(now).await;
            }
            recovery::RestartDecision::Cooldown { remaining } => {
                tokio::time::sleep(remaining).await;
                self.record_and_restart(self.now_ms()).await;
            }
            recovery::RestartDecision::Restart { attempt } => {
                self.emit(Event::Restarting { kind: self.kind, attempt });
                self.record_and_restart(now).await;
            }
        }
    }

    async fn record_and_restart(self: &Arc<Self>, now: u64) {
        {
            let mut inner = self.inner.lock().await;
            inner.restart_state.record_restart(now);
            inner.lifecycle = LifecycleState::Idle;
        }
        self.start().await;
    }

    /// §4.4.4: a death-reason file starting with `"kys"` after a failed
    /// health check is an auto-respawn condition, bypassed only when the
    /// user-stop flag is set (already checked by the caller).
    async fn check_kys_auto_respawn(self: &Arc<Self>) -> bool {
        let death_reason_path = self.identity.death_reason_path();
        let Ok(contents) = std::fs::read_to_string(&death_reason_path) else {
            return false;
        };
        if !contents.trim_start().starts_with("kys") {
            return false;
        }
        let _ = std::fs::remove_file(&death_reason_path);
        let _ = std::fs::remove_file(self.identity.stopped_flag_path(self.kind));
        {
            let mut inner = self.inner.lock().await;
            inner.consecutive_failures = 0;
            inner.restart_state.reset();
            inner.lifecycle = LifecycleState::Idle;
        }
        self.start().await;
        true
    }

    /// §4.4: SIGTERM then (after grace) SIGKILL; remove pid file and socket.
    pub async fn stop(self: &Arc<Self>) {
        let pid = {
            let mut inner = self.inner.lock().await;
            let pid = match inner.lifecycle {
                LifecycleState::Running { managed: true, pid } => pid,
                _ => None,
            };
            inner.lifecycle = LifecycleState::Stopping;
            pid
        };

        self.expected_exit.store(true, Ordering::SeqCst);

        if let Some(pid) = pid {
            let signaler = self.adapters.signaler();
            let _ = signaler.send(pid, Signal::Term).await;
            tokio::time::sleep(Duration::from_millis(500)).await;
            let inspector = self.adapters.inspector();
            if inspector.is_alive(pid).await {
                let _ = signaler.send(pid, Signal::Kill).await;
            }
        }

        let _ = std::fs::remove_file(self.identity.pid_path(self.kind));
        let _ = std::fs::remove_file(self.identity.socket_path(self.kind));
        *self.child.lock().await = None;

        let mut inner = self.inner.lock().await;
        inner.lifecycle = LifecycleState::Idle;
        drop(inner);
        self.emit(Event::Stopped { kind: self.kind });
    }

    pub async fn user_stop(self: &Arc<Self>) {
        let _ = std::fs::write(self.identity.stopped_flag_path(self.kind), b"");
        self.stop().await;
    }

    pub async fn user_start(self: &Arc<Self>) -> bool {
        let _ = std::fs::remove_file(self.identity.stopped_flag_path(self.kind));
        {
            let mut inner = self.inner.lock().await;
            inner.restart_state.reset();
            inner.consecutive_failures = 0;
        }
        self.stop().await;
        self.start().await
    }

    /// §4.4: SIGHUP; fall through to a cold restart if health does not
    /// recover within the startup grace.
    pub async fn warm_restart(self: &Arc<Self>) -> bool {
        if self.kind != SidecarKind::CoT {
            return self.cold_restart().await;
        }
        let pid = {
            let inner = self.inner.lock().await;
            match inner.lifecycle {
                LifecycleState::Running { pid, .. } => pid,
                _ => None,
            }
        };
        let Some(pid) = pid else {
            return self.cold_restart().await;
        };

        let signaler = self.adapters.signaler();
        if signaler.send(pid, Signal::Hup).await.is_err() {
            return self.cold_restart().await;
        }

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while tokio::time::Instant::now() < deadline {
            if self.probe_health().await.0 {
                self.drain_pending_queue().await;
                return true;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        self.cold_restart().await
    }

    pub async fn cold_restart(self: &Arc<Self>) -> bool {
        self.stop().await;
        let ok = self.start().await;
        if ok {
            self.drain_pending_queue().await;
        }
        ok
    }

    /// §4.4: connects to the socket, sends a probe, parses the response.
    pub async fn health_check(&self) -> HealthCheckResult {
        let start = tokio::time::Instant::now();
        let (ok, detail) = self.probe_health().await;
        HealthCheckResult {
            ok,
            rtt_ms: start.elapsed().as_millis() as u64,
            details: detail,
        }
    }

    async fn probe_health(&self) -> (bool, Option<String>) {
        let client = self.adapters.client();
        let socket_path = self.identity.socket_path(self.kind);
        let request = match self.kind {
            SidecarKind::Embedding => sidecar_client::embedding_health_request(),
            SidecarKind::CoT => sidecar_client::cot_health_request(),
        };
        match client.request(&socket_path, request, self.config.health_timeout).await {
            Ok(response) => {
                let ok = !sidecar_client::response_has_error(&response);
                (ok, Some(response.to_string()))
            }
            Err(e) => (false, Some(e.to_string())),
        }
    }

    /// §4.4.6: enqueue a request for a not-currently-running CoT sidecar.
    pub async fn queue_request(&self, payload: Value) -> oneshot::Receiver<Result<Value, SidecarClientError>> {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock().await;
        if inner.pending.len() >= self.config.pending_queue_cap {
            if let Some(evicted) = inner.pending.pop_front() {
                let _ = evicted.responder.send(Err(SidecarClientError::QueueOverflow));
                inner.queue_dropped_count += 1;
            }
            drop(inner);
            self.emit(Event::QueueOverflow { kind: self.kind, dropped: 1 });
            inner = self.inner.lock().await;
        }
        inner.pending.push_back(PendingRequest { payload, enqueued_at_ms: self.now_ms(), responder: tx });
        rx
    }

    async fn drain_pending_queue(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock().await;
            if inner.draining || inner.pending.is_empty() {
                return;
            }
            inner.draining = true;
        }

        let mut processed = 0u64;
        let mut failed = 0u64;
        let ttl_ms = self.config.pending_request_ttl.as_millis() as u64;
        loop {
            let next = {
                let mut inner = self.inner.lock().await;
                inner.pending.pop_front()
            };
            let Some(request) = next else { break };

            if self.now_ms().saturating_sub(request.enqueued_at_ms) > ttl_ms {
                let _ = request.responder.send(Err(SidecarClientError::Timeout(self.config.pending_request_ttl)));
                failed += 1;
                continue;
            }

            let client = self.adapters.client();
            let result = client.request(&self.identity.socket_path(self.kind), request.payload, self.config.health_timeout).await;
            if result.is_err() {
                failed += 1;
            } else {
                processed += 1;
            }
            let _ = request.responder.send(result);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        {
            let mut inner = self.inner.lock().await;
            inner.draining = false;
        }
        self.emit(Event::QueueDrained { kind: self.kind });
        debug!(processed, failed, "pending queue drained");
    }

    pub async fn get_status(&self) -> SidecarStatus {
        let inner = self.inner.lock().await;
        let (running, managed, pid) = match inner.lifecycle {
            LifecycleState::Running { managed, pid } => (true, managed, pid),
            _ => (false, false, None),
        };
        SidecarStatus {
            running,
            managed,
            pid,
            consecutive_failures: inner.consecutive_failures,
            restart_count: inner.restart_state.restart_count,
            user_stopped: self.user_stopped(),
        }
    }

    pub async fn shutdown(self: &Arc<Self>) {
        self.stop().await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheckResult {
    pub ok: bool,
    pub rtt_ms: u64,
    pub details: Option<String>,
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
