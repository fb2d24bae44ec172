//! Owns the set of monitored servers and their listener tasks.
//!
//! All mutations of the active set and the task table go through supervisor
//! methods and happen under one lock with no suspension point between check
//! and mutation, so the sweep and a manual connect can never double-start a
//! listener for the same server.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::context::AppContext;
use crate::core::listener;
use crate::core::router::EventRouter;
use crate::registry::RemoteServerRef;
use crate::rpc::api::ServerApi;
use crate::rpc::client::RpcClient;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("server `{0}` is not registered")]
    UnknownServer(String),
    #[error("already listening to server `{0}`")]
    AlreadyListening(String),
    #[error("not currently listening to server `{0}`")]
    NotListening(String),
}

struct TaskHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Registries {
    active: HashSet<String>,
    tasks: HashMap<String, TaskHandle>,
}

pub struct Supervisor {
    inner: Arc<Inner>,
}

struct Inner {
    ctx: AppContext,
    client: RpcClient,
    router: Arc<EventRouter>,
    registries: Mutex<Registries>,
    sweep: Mutex<Option<TaskHandle>>,
}

impl Supervisor {
    pub fn new(ctx: AppContext) -> Self {
        let client = RpcClient::new(Duration::from_secs(ctx.config.rpc_timeout_secs));
        let router = Arc::new(EventRouter::new(ctx.prefs.clone(), ctx.sink.clone()));
        Self {
            inner: Arc::new(Inner {
                ctx,
                client,
                router,
                registries: Mutex::new(Registries::default()),
                sweep: Mutex::new(None),
            }),
        }
    }

    /// Start the periodic liveness sweep. Idempotent.
    pub fn start_monitoring(&self) {
        let mut sweep = self.inner.sweep.lock().unwrap();
        if sweep.is_some() {
            debug!("sweep already running");
            return;
        }
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let inner = self.inner.clone();
        let task = tokio::spawn(async move { sweep_loop(inner, token).await });
        *sweep = Some(TaskHandle { cancel, task });
        info!("liveness sweep started");
    }

    /// Tear down the sweep and every listener; both registries end empty and
    /// no background task outlives this call.
    pub async fn stop_monitoring(&self) {
        let sweep = self.inner.sweep.lock().unwrap().take();
        if let Some(handle) = sweep {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }

        let drained: Vec<(String, TaskHandle)> = {
            let mut regs = self.inner.registries.lock().unwrap();
            regs.active.clear();
            regs.tasks.drain().collect()
        };
        for (name, handle) in drained {
            handle.cancel.cancel();
            let _ = handle.task.await;
            debug!(server = %name, "listener stopped");
        }
        info!("monitoring stopped");
    }

    /// Start listening to a registered server immediately, bypassing the
    /// sweep's liveness check.
    pub async fn connect(&self, name: &str) -> Result<(), SupervisorError> {
        let server = self
            .inner
            .ctx
            .registry
            .resolve_name(name)
            .await
            .ok_or_else(|| SupervisorError::UnknownServer(name.to_string()))?;
        Inner::start_listener(&self.inner, server)?;
        info!(server = %name, "listening (manual connect)");
        Ok(())
    }

    /// Stop listening to a server: cancel its task, await its termination,
    /// and drop both registry entries.
    pub async fn disconnect(&self, name: &str) -> Result<(), SupervisorError> {
        let handle = {
            let mut regs = self.inner.registries.lock().unwrap();
            match regs.tasks.remove(name) {
                Some(handle) => {
                    regs.active.remove(name);
                    handle
                }
                None => return Err(SupervisorError::NotListening(name.to_string())),
            }
        };
        handle.cancel.cancel();
        let _ = handle.task.await;
        info!(server = %name, "stopped listening");
        Ok(())
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.inner.registries.lock().unwrap().active.contains(name)
    }
}

impl Inner {
    /// Check-and-mark under a single lock acquisition. The spawned wrapper
    /// also deregisters under the same lock, so a listener that dies
    /// instantly still cannot race the insertion below.
    fn start_listener(inner: &Arc<Inner>, server: RemoteServerRef) -> Result<(), SupervisorError> {
        let mut regs = inner.registries.lock().unwrap();
        if regs.active.contains(&server.name) {
            return Err(SupervisorError::AlreadyListening(server.name));
        }

        let name = server.name.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let router = inner.router.clone();
        let inner_for_task = inner.clone();
        let task_name = name.clone();
        let task = tokio::spawn(async move {
            listener::run(server, router, token).await;
            Inner::deregister(&inner_for_task, &task_name);
        });

        regs.active.insert(name.clone());
        regs.tasks.insert(name, TaskHandle { cancel, task });
        Ok(())
    }

    /// Remove both registry entries together. A no-op when `disconnect` or
    /// `stop_monitoring` already removed them, so removal happens exactly
    /// once per listener.
    fn deregister(inner: &Arc<Inner>, name: &str) {
        let mut regs = inner.registries.lock().unwrap();
        if regs.tasks.remove(name).is_some() {
            debug!(server = %name, "listener deregistered");
        }
        regs.active.remove(name);
    }
}

async fn sweep_loop(inner: Arc<Inner>, cancel: CancellationToken) {
    let period = Duration::from_secs(inner.ctx.config.sweep_interval_secs);
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => sweep_once(&inner).await,
        }
    }
}

/// Poll every registered server not already being listened to; promote the
/// live ones. A failure for one server never aborts the rest of the sweep.
async fn sweep_once(inner: &Arc<Inner>) {
    let servers = inner.ctx.registry.all().await;
    for server in servers {
        if inner
            .registries
            .lock()
            .unwrap()
            .active
            .contains(&server.name)
        {
            continue;
        }

        let api = ServerApi::new(inner.client.clone(), server.address.clone());
        match api.status().await {
            Ok(status) if status.started => {
                debug!(server = %server.name, "server is up, starting listener");
                let name = server.name.clone();
                let channel = server.channel;
                if Inner::start_listener(inner, server).is_ok() {
                    inner
                        .router
                        .plain(
                            channel,
                            "Listening",
                            format!("Started listening for server `{}`.", name),
                        )
                        .await;
                }
            }
            Ok(_) => trace!(server = %server.name, "server not started yet"),
            Err(e) => debug!(server = %server.name, error = %e, "liveness check failed"),
        }
    }
}
