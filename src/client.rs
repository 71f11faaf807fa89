//! The secure-transport client seam and the shared client runtime.
//!
//! 安全传输客户端接缝以及共享的客户端运行时。

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::session::SecureSession;
use async_trait::async_trait;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// A client capable of initiating secure-transport connections.
///
/// Implementations own their worker threads; the connector never creates
/// threads itself.
///
/// 能够发起安全传输连接的客户端。
///
/// 实现拥有自己的工作线程；连接器本身从不创建线程。
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Connects to the remote address as the given principal and yields the
    /// established session.
    /// 以给定主体连接到远端地址，并产生已建立的会话。
    async fn connect(&self, principal: &str, remote_addr: SocketAddr)
    -> Result<Arc<dyn SecureSession>>;
}

/// The process-wide client runtime shared by all lifecycle controllers.
///
/// This replaces load-time global state with an explicitly constructed,
/// injectable object: the surrounding application owns `start`/`stop`, while
/// controllers receive it as an `Arc<dyn TransportClient>`. Live sessions are
/// tracked weakly so `stop` can force-close whatever is still open at process
/// exit.
///
/// 由所有生命周期控制器共享的进程级客户端运行时。
///
/// 它用一个显式构造、可注入的对象取代加载期的全局状态：外围应用负责
/// `start`/`stop`，控制器则以 `Arc<dyn TransportClient>` 的形式接收它。
/// 活动会话以弱引用方式跟踪，以便 `stop` 在进程退出时强制关闭仍然
/// 打开的会话。
pub struct TransportRuntime<C: TransportClient> {
    client: C,
    config: ClientConfig,
    started: AtomicBool,
    sessions: DashMap<u64, Weak<dyn SecureSession>>,
}

impl<C: TransportClient> TransportRuntime<C> {
    /// Wraps a concrete client. The runtime is created stopped.
    /// 包装一个具体客户端。运行时创建时处于停止状态。
    pub fn new(client: C, config: ClientConfig) -> Self {
        Self {
            client,
            config,
            started: AtomicBool::new(false),
            sessions: DashMap::new(),
        }
    }

    /// Starts the runtime. Connect attempts are rejected until this is
    /// called. Idempotent.
    /// 启动运行时。在调用之前连接尝试会被拒绝。幂等。
    pub fn start(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            info!(
                worker_threads = self.config.worker_threads,
                tcp_nodelay = self.config.tcp_nodelay,
                auth_timeout = ?self.config.auth_timeout,
                idle_timeout = ?self.config.idle_timeout,
                read_timeout = ?self.config.read_timeout,
                "transport runtime started"
            );
        }
    }

    /// Whether the runtime has been started.
    /// 运行时是否已启动。
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Stops the runtime and force-closes every session that is still alive.
    /// Further connect attempts are rejected.
    ///
    /// 停止运行时并强制关闭所有仍然存活的会话。之后的连接尝试会被拒绝。
    pub async fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        let live: Vec<Arc<dyn SecureSession>> = self
            .sessions
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .collect();
        self.sessions.clear();
        for session in live {
            if !session.is_closed() {
                if let Err(e) = session.close(true).await {
                    warn!(error = %e, "failed to close session during runtime stop");
                }
            }
        }
        info!("transport runtime stopped");
    }

    /// The number of tracked sessions that are still alive.
    /// 当前仍然存活的被跟踪会话数量。
    pub fn live_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    fn track(&self, session: &Arc<dyn SecureSession>) {
        // Dropped sessions leave dead weak entries behind; prune them while
        // we are here anyway.
        // 已丢弃的会话会留下失效的弱引用条目；顺便在这里清理掉。
        self.sessions.retain(|_, weak| weak.strong_count() > 0);

        let mut id = rand::random::<u64>();
        loop {
            match self.sessions.entry(id) {
                dashmap::mapref::entry::Entry::Vacant(vacant) => {
                    vacant.insert(Arc::downgrade(session));
                    break;
                }
                dashmap::mapref::entry::Entry::Occupied(_) => {
                    id = rand::random::<u64>();
                }
            }
        }
        debug!(session_id = id, "session tracked by transport runtime");
    }
}

#[async_trait]
impl<C: TransportClient> TransportClient for TransportRuntime<C> {
    async fn connect(
        &self,
        principal: &str,
        remote_addr: SocketAddr,
    ) -> Result<Arc<dyn SecureSession>> {
        if !self.is_started() {
            return Err(Error::ClientNotStarted);
        }
        let session = self.client.connect(principal, remote_addr).await?;
        self.track(&session);
        Ok(session)
    }
}
