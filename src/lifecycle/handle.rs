//! The pipeline-facing handle to a lifecycle controller.
//!
//! 面向流水线的生命周期控制器句柄。

use super::command::ControllerEvent;
use super::controller::LifecycleController;
use crate::auth::Authenticator;
use crate::client::TransportClient;
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::pipeline::PipelineContext;
use crate::promise::Promise;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Completion of a higher-level protocol handshake running over the opened
/// channel. When supplied, its success (not channel-open) resolves the
/// connect attempt.
///
/// 在已打开通道上运行的更高层协议握手的完成信号。提供时，
/// 以它的成功（而非通道打开）来解析连接尝试。
pub type NegotiationFuture = oneshot::Receiver<Result<()>>;

/// A cloneable handle to one connection's lifecycle controller actor.
///
/// Every method funnels into the controller's serialized event stream, so
/// calls from arbitrary tasks or threads never interleave inside the state
/// machine.
///
/// 指向单个连接生命周期控制器actor的可克隆句柄。
///
/// 每个方法都汇入控制器的串行化事件流，因此来自任意任务或线程的调用
/// 绝不会在状态机内部交错。
pub struct LifecycleHandle {
    event_tx: mpsc::Sender<ControllerEvent>,
}

impl Clone for LifecycleHandle {
    fn clone(&self) -> Self {
        Self {
            event_tx: self.event_tx.clone(),
        }
    }
}

impl LifecycleHandle {
    /// Spawns the controller actor for one connection attempt.
    ///
    /// 为一次连接尝试派生控制器actor。
    pub fn spawn(
        client: Arc<dyn TransportClient>,
        auth: Arc<dyn Authenticator>,
        ctx: Arc<dyn PipelineContext>,
        negotiation: Option<NegotiationFuture>,
        config: ConnectionConfig,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_queue_capacity);
        let controller = LifecycleController::new(
            client,
            auth,
            ctx,
            negotiation,
            config,
            event_rx,
            &event_tx,
        );
        tokio::spawn(controller.run());
        Self { event_tx }
    }

    /// Begins the connect sequence and waits for its single outcome:
    /// transport connect, authentication, channel open and, when a
    /// negotiation future was supplied, negotiation itself.
    ///
    /// 开始连接流程并等待其唯一结果：传输连接、认证、通道打开，
    /// 以及在提供了协商future时的协商本身。
    pub async fn connect(&self, remote_addr: SocketAddr) -> Result<()> {
        let (promise, completion) = Promise::pair();
        self.event_tx
            .send(ControllerEvent::Connect {
                remote_addr,
                promise,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;
        completion.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Writes one outbound protocol message. Fails with
    /// [`Error::NotConnected`] before activation.
    ///
    /// 写出一条出站协议消息。激活之前以 [`Error::NotConnected`] 失败。
    pub async fn write(&self, data: Bytes) -> Result<()> {
        let (promise, completion) = Promise::pair();
        self.event_tx
            .send(ControllerEvent::Write { data, promise })
            .await
            .map_err(|_| Error::NotConnected)?;
        completion.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Requests teardown and waits until it has completed. Always succeeds;
    /// concurrent and repeated calls are safe.
    ///
    /// 请求拆除并等待其完成。总是成功；并发和重复调用都是安全的。
    pub async fn close(&self) -> Result<()> {
        let (promise, completion) = Promise::pair();
        if self
            .event_tx
            .send(ControllerEvent::Close { promise })
            .await
            .is_err()
        {
            // The actor is gone, which means teardown already ran.
            // actor已不存在，说明拆除已经执行过。
            debug!("close requested on an already torn-down connection");
            return Ok(());
        }
        match completion.await {
            Ok(result) => result,
            Err(_) => Ok(()),
        }
    }

    /// Alias of [`close`]: both routes funnel into the same idempotent
    /// teardown.
    ///
    /// [`close`] 的别名：两条路径汇入同一个幂等拆除流程。
    ///
    /// [`close`]: LifecycleHandle::close
    pub async fn disconnect(&self) -> Result<()> {
        self.close().await
    }
}
