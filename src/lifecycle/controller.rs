//! The lifecycle state machine and its actor loop.
//!
//! 生命周期状态机及其actor循环。

use super::command::ControllerEvent;
use crate::auth::Authenticator;
use crate::client::TransportClient;
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::pipeline::PipelineContext;
use crate::promise::Promise;
use crate::session::{SecureSession, StreamingMode, SubsystemChannel};
use crate::writer::OutboundWriter;
use std::mem;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// The state of a connection attempt.
/// 一次连接尝试的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connect has been requested yet.
    /// 尚未请求连接。
    Idle,
    /// Waiting for the transport-connect future.
    /// 等待传输连接future。
    Connecting,
    /// Waiting for the authentication future.
    /// 等待认证future。
    Authenticating,
    /// Waiting for the subsystem-channel open future.
    /// 等待子系统通道打开future。
    OpeningChannel,
    /// The channel is open and writes are accepted.
    /// 通道已打开，接受写入。
    Active,
    /// Teardown is in progress.
    /// 拆除进行中。
    Closing,
    /// Teardown has completed. Terminal.
    /// 拆除已完成。终态。
    Closed,
}

/// Tracks the outward connect promise across its whole life, including the
/// outcome after resolution: teardown must know whether the promise ever
/// succeeded to decide whether a pipeline-inactive notification is due.
///
/// 在整个生命周期内跟踪对外的连接承诺，包括解析之后的结果：
/// 拆除流程需要知道承诺是否曾经成功，以决定是否发出流水线非活动通知。
enum ConnectPromise {
    Unset,
    Pending(Promise),
    Succeeded,
    Failed,
}

impl ConnectPromise {
    fn resolve_success(&mut self) {
        if self.is_pending() {
            if let Self::Pending(promise) = mem::replace(self, Self::Succeeded) {
                promise.succeed();
            }
        }
    }

    fn resolve_failure(&mut self, cause: Error) {
        if self.is_pending() {
            if let Self::Pending(promise) = mem::replace(self, Self::Failed) {
                promise.fail(cause);
            }
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

enum Flow {
    Continue,
    Stop,
}

/// The per-connection actor owning the session, the channel, and the connect
/// promise.
///
/// One controller serves exactly one connect attempt; it is not reused across
/// reconnects. All owned handles are created while the state machine moves
/// forward and released by [`teardown`], after which the actor stops. The
/// actor holds only a weak sender to its own queue, so a connection whose
/// handles all disappear is torn down instead of lingering.
///
/// 拥有会话、通道和连接承诺的每连接actor。
///
/// 一个控制器只服务一次连接尝试；重连时不会复用。所有持有的句柄在状态机
/// 前进时创建，并由 [`teardown`] 释放，之后actor停止。actor对自己的队列
/// 只持有弱发送端，因此句柄全部消失的连接会被拆除而不是滞留。
///
/// [`teardown`]: LifecycleController::teardown
pub(crate) struct LifecycleController {
    client: Arc<dyn TransportClient>,
    auth: Arc<dyn Authenticator>,
    ctx: Arc<dyn PipelineContext>,
    config: ConnectionConfig,

    event_rx: mpsc::Receiver<ControllerEvent>,
    event_tx: mpsc::WeakSender<ControllerEvent>,

    state: ConnectionState,
    connect_promise: ConnectPromise,
    session: Option<Arc<dyn SecureSession>>,
    channel: Option<Arc<dyn SubsystemChannel>>,
    writer: Option<OutboundWriter>,

    /// The negotiation future, consumed when the connect begins.
    /// 协商future，在连接开始时被消耗。
    negotiation: Option<oneshot::Receiver<Result<()>>>,
    /// The watcher task observing the negotiation future. Present exactly
    /// while the listener is registered; aborted during teardown.
    /// 观察协商future的watcher任务。仅在监听器注册期间存在；
    /// 拆除时被中止。
    negotiation_watch: Option<JoinHandle<()>>,
    has_negotiation: bool,

    /// One-shot admission gate for the teardown body.
    /// 拆除主体的单次准入门。
    torn_down: bool,
}

impl LifecycleController {
    pub(crate) fn new(
        client: Arc<dyn TransportClient>,
        auth: Arc<dyn Authenticator>,
        ctx: Arc<dyn PipelineContext>,
        negotiation: Option<oneshot::Receiver<Result<()>>>,
        config: ConnectionConfig,
        event_rx: mpsc::Receiver<ControllerEvent>,
        event_tx: &mpsc::Sender<ControllerEvent>,
    ) -> Self {
        Self {
            client,
            auth,
            ctx,
            config,
            event_rx,
            event_tx: event_tx.downgrade(),
            state: ConnectionState::Idle,
            connect_promise: ConnectPromise::Unset,
            session: None,
            channel: None,
            writer: None,
            negotiation,
            negotiation_watch: None,
            has_negotiation: false,
            torn_down: false,
        }
    }

    /// Runs the actor until teardown completes or every handle is gone.
    ///
    /// 运行actor，直到拆除完成或所有句柄都已消失。
    pub(crate) async fn run(mut self) {
        while let Some(event) = self.event_rx.recv().await {
            trace!(event = event.name(), state = ?self.state, "controller event");
            if matches!(self.on_event(event).await, Flow::Stop) {
                break;
            }
        }

        // Handles may disappear without an explicit close; resources must
        // still be released exactly once.
        // 句柄可能在没有显式关闭的情况下消失；资源仍须恰好释放一次。
        if !self.torn_down {
            debug!("all lifecycle handles gone, tearing down");
            self.teardown(None, None).await;
        }

        // Events already queued when the actor stopped still carry promises
        // and, in the worst case, a freshly established session.
        // actor停止时已入队的事件仍携带承诺，最坏情况下还带着一个
        // 刚建立的会话。
        self.event_rx.close();
        while let Ok(event) = self.event_rx.try_recv() {
            trace!(event = event.name(), "draining event after teardown");
            event.resolve_after_teardown();
        }
    }

    /// The single dispatch point of the state machine.
    /// 状态机的唯一分发点。
    async fn on_event(&mut self, event: ControllerEvent) -> Flow {
        match event {
            ControllerEvent::Connect {
                remote_addr,
                promise,
            } => self.on_connect(remote_addr, promise),
            ControllerEvent::ConnectComplete(result) => match result {
                Ok(session) => self.on_session_established(session),
                Err(cause) => return self.setup_failure(cause).await,
            },
            ControllerEvent::AuthComplete(result) => match result {
                Ok(()) => {
                    if let Err(cause) = self.on_authenticated() {
                        return self.setup_failure(cause).await;
                    }
                }
                Err(cause) => {
                    return self
                        .setup_failure(Error::AuthenticationFailed(Box::new(cause)))
                        .await;
                }
            },
            ControllerEvent::OpenComplete(result) => match result {
                Ok(()) => {
                    if let Err(cause) = self.on_channel_open() {
                        return self.setup_failure(cause).await;
                    }
                }
                Err(cause) => return self.setup_failure(cause).await,
            },
            ControllerEvent::NegotiationComplete(result) => match result {
                Ok(()) => self.connect_promise.resolve_success(),
                Err(cause) => {
                    // A connection whose negotiation failed is useless; tear
                    // it down like any other setup failure.
                    // 协商失败的连接毫无用处；像其他建连失败一样拆除。
                    return self.setup_failure(cause).await;
                }
            },
            ControllerEvent::Write { data, promise } => {
                match (&self.state, &self.writer) {
                    (ConnectionState::Active, Some(writer)) => writer.write(data, promise),
                    // Writing before activation is an explicit failure, not
                    // a null-handle accident.
                    // 在激活之前写入是一个显式失败，而非空句柄事故。
                    _ => promise.fail(Error::NotConnected),
                }
            }
            ControllerEvent::Close { promise } => {
                return self.teardown(None, Some(promise)).await;
            }
            ControllerEvent::RemoteClosed => {
                debug!("remote side closed the subsystem channel");
                return self.teardown(None, None).await;
            }
        }
        Flow::Continue
    }

    /// Idle → Connecting: records the promise, registers the negotiation
    /// listener, and starts the transport connect on a detached task bounded
    /// by the caller's connect timeout. The bound is a scheduled cancellation
    /// of the connect future; no thread ever blocks on it.
    ///
    /// Idle → Connecting：记录承诺、注册协商监听器，并在一个受调用方
    /// 连接超时约束的独立任务上发起传输连接。该时限是对连接future的
    /// 计划性取消；没有任何线程会阻塞在上面。
    fn on_connect(&mut self, remote_addr: SocketAddr, promise: Promise) {
        if self.state != ConnectionState::Idle {
            warn!(state = ?self.state, "connect rejected outside idle state");
            promise.fail(Error::ConnectionAborted);
            return;
        }
        let Some(tx) = self.event_tx.upgrade() else {
            promise.fail(Error::ConnectionAborted);
            return;
        };

        debug!(%remote_addr, "starting secure-transport connect");
        self.connect_promise = ConnectPromise::Pending(promise);

        if let Some(negotiation) = self.negotiation.take() {
            self.has_negotiation = true;
            // The watcher holds only a weak sender: an abandoned controller
            // must not be kept alive by a negotiation that never completes.
            // watcher只持有弱发送端：被遗弃的控制器不能被一个永不完成的
            // 协商拖着不放。
            let weak = tx.downgrade();
            self.negotiation_watch = Some(tokio::spawn(async move {
                let outcome = match negotiation.await {
                    Ok(result) => result,
                    // A dropped negotiation driver can never succeed.
                    // 被丢弃的协商驱动方永远不可能成功。
                    Err(_) => Err(Error::NegotiationFailed),
                };
                if let Some(tx) = weak.upgrade() {
                    let _ = tx
                        .send(ControllerEvent::NegotiationComplete(outcome))
                        .await;
                }
            }));
        }

        self.state = ConnectionState::Connecting;

        let client = self.client.clone();
        let auth = self.auth.clone();
        let timeout = self.ctx.connect_timeout();
        tokio::spawn(async move {
            let result =
                match tokio::time::timeout(timeout, client.connect(auth.principal(), remote_addr))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(Error::ConnectTimeout(timeout)),
                };
            if let Err(mpsc::error::SendError(event)) =
                tx.send(ControllerEvent::ConnectComplete(result)).await
            {
                // The controller tore down while we were connecting.
                // 控制器在连接期间已经拆除。
                event.resolve_after_teardown();
            }
        });
    }

    /// Connecting → Authenticating.
    fn on_session_established(&mut self, session: Arc<dyn SecureSession>) {
        if self.state != ConnectionState::Connecting {
            warn!(state = ?self.state, "stray session establishment, closing it");
            tokio::spawn(async move {
                let _ = session.close(true).await;
            });
            return;
        }
        let Some(tx) = self.event_tx.upgrade() else {
            // Abandoned mid-setup; the post-loop teardown reclaims the
            // session handle stored below.
            // 建连中途被遗弃；循环结束后的拆除会回收下面存下的会话句柄。
            self.session = Some(session);
            return;
        };

        trace!("secure session established, starting authentication");
        self.session = Some(session.clone());
        self.state = ConnectionState::Authenticating;

        let auth = self.auth.clone();
        tokio::spawn(async move {
            let result = auth.authenticate(session).await;
            let _ = tx.send(ControllerEvent::AuthComplete(result)).await;
        });
    }

    /// Authenticating → OpeningChannel: creates the subsystem channel, sets
    /// streaming mode before opening, and starts the open on a detached
    /// task. A synchronous creation failure takes the same error path as an
    /// asynchronous open failure.
    ///
    /// Authenticating → OpeningChannel：创建子系统通道，在打开之前设置
    /// 流模式，并在独立任务上发起打开。同步的创建失败与异步的打开失败
    /// 走同一条错误路径。
    fn on_authenticated(&mut self) -> Result<()> {
        if self.state != ConnectionState::Authenticating {
            warn!(state = ?self.state, "stray authentication result ignored");
            return Ok(());
        }
        let session = self.session.as_ref().ok_or(Error::NotConnected)?;

        debug!(subsystem = %self.config.subsystem, "session authenticated, opening subsystem channel");
        let channel = session.create_subsystem_channel(&self.config.subsystem)?;
        channel.set_streaming_mode(StreamingMode::Async);
        self.channel = Some(channel.clone());
        self.state = ConnectionState::OpeningChannel;

        let Some(tx) = self.event_tx.upgrade() else {
            return Ok(());
        };
        tokio::spawn(async move {
            let result = channel.open().await;
            let _ = tx.send(ControllerEvent::OpenComplete(result)).await;
        });
        Ok(())
    }

    /// OpeningChannel → Active: resolves the connect promise (unless a
    /// negotiation future is authoritative), instantiates the outbound
    /// writer, notifies the pipeline, and registers the remote-close trigger.
    ///
    /// OpeningChannel → Active：解析连接承诺（除非以协商future为准）、
    /// 实例化出站写入器、通知流水线并注册远端关闭触发器。
    fn on_channel_open(&mut self) -> Result<()> {
        if self.state != ConnectionState::OpeningChannel {
            warn!(state = ?self.state, "stray channel-open result ignored");
            return Ok(());
        }
        let Some(channel) = self.channel.as_ref() else {
            return Err(Error::NotConnected);
        };

        debug!("subsystem channel open, connection active");
        self.state = ConnectionState::Active;

        if !self.has_negotiation {
            self.connect_promise.resolve_success();
        }

        let sink = channel.input_sink()?;
        self.writer = Some(OutboundWriter::new(sink, self.config.write_queue_capacity));

        // The session library may fire this from any thread, and the event
        // queue may be momentarily full of write traffic; delivery must wait
        // for capacity instead of being dropped.
        // 会话库可能从任意线程触发此回调，而事件队列可能恰好被写入流量
        // 占满；投递必须等待容量，而不是被丢弃。
        let weak = self.event_tx.clone();
        let runtime = tokio::runtime::Handle::current();
        channel.on_close(Box::new(move || {
            runtime.spawn(async move {
                if let Some(tx) = weak.upgrade() {
                    let _ = tx.send(ControllerEvent::RemoteClosed).await;
                }
            });
        }));

        self.ctx.fire_active();
        Ok(())
    }

    /// Routes a setup-stage failure into the single teardown path. The
    /// connect promise, if still pending, fails with the original cause.
    ///
    /// 将建连阶段的失败汇入唯一的拆除路径。连接承诺若仍未决，
    /// 以原始原因失败。
    async fn setup_failure(&mut self, cause: Error) -> Flow {
        warn!(state = ?self.state, error = %cause, "connection setup failed");
        self.teardown(Some(cause), None).await
    }

    /// The idempotent teardown routine. Every step tolerates the absence of
    /// the handles a failed setup never created.
    ///
    /// 幂等的拆除例程。每一步都容忍失败的建连从未创建过的句柄缺失。
    async fn teardown(&mut self, cause: Option<Error>, promise: Option<Promise>) -> Flow {
        if self.torn_down {
            if let Some(promise) = promise {
                promise.succeed();
            }
            return Flow::Stop;
        }
        self.torn_down = true;
        self.state = ConnectionState::Closing;
        debug!(pending = self.connect_promise.is_pending(), "tearing down connection");

        // 1. The pipeline only learns about inactivity if it was ever told
        //    the connection was active.
        // 1. 只有在流水线曾被告知连接活动时，才通知其变为非活动。
        if self.connect_promise.succeeded() {
            self.ctx.fire_inactive();
        }

        // 2. Release buffered write resources.
        // 2. 释放缓冲的写资源。
        if let Some(writer) = self.writer.take() {
            writer.close();
        }

        // 3. A promise still pending here means setup never finished.
        // 3. 此时仍未决的承诺意味着建连从未完成。
        self.connect_promise
            .resolve_failure(cause.unwrap_or(Error::NegotiationFailed));

        // 4. Remove the negotiation listener so a late completion cannot
        //    touch a torn-down controller.
        // 4. 移除协商监听器，避免迟到的完成触碰已拆除的控制器。
        if let Some(watch) = self.negotiation_watch.take() {
            watch.abort();
        }

        // 5. Graceful session close, escalated to a forceful close on a
        //    detached task when it does not complete closure.
        // 5. 优雅关闭会话，未完成时在独立任务上升级为强制关闭。
        if let Some(session) = self.session.take() {
            if !session.is_closed() && !session.is_closing() {
                tokio::spawn(async move {
                    let closed = matches!(session.close(false).await, Ok(true));
                    if !closed {
                        debug!("graceful session close incomplete, forcing");
                        if let Err(e) = session.close(true).await {
                            warn!(error = %e, "forceful session close failed");
                        }
                    }
                });
            }
        }

        // 6. The pipeline's own transport cleanup must never abort teardown.
        // 6. 流水线自身的传输清理绝不能中断拆除。
        if let Err(e) = self.ctx.release_transport() {
            warn!(error = %e, "pipeline transport cleanup failed, ignoring");
        }

        // 7. Close and clear the channel handle.
        // 7. 关闭并清除通道句柄。
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!(error = %e, "subsystem channel close failed");
            }
        }

        // 8. Teardown itself cannot fail from the caller's point of view.
        // 8. 从调用方的角度看，拆除本身不会失败。
        if let Some(promise) = promise {
            promise.succeed();
        }
        self.state = ConnectionState::Closed;
        debug!("connection torn down");
        Flow::Stop
    }
}
