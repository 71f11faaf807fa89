//! The seam towards the downstream event-driven pipeline.
//!
//! 面向下游事件驱动流水线的接缝。

use crate::error::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Lifecycle events emitted towards the pipeline.
/// 向流水线发出的生命周期事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The connection went active: the subsystem channel is open and writes
    /// are accepted.
    /// 连接进入活动状态：子系统通道已打开，可以接受写入。
    Active,
    /// A previously active connection became inactive. Higher layers use
    /// this to trigger reconnection logic.
    /// 先前活动的连接变为非活动。上层据此触发重连逻辑。
    Inactive,
}

/// The per-connection handle through which the controller emits lifecycle
/// events and obtains configuration.
///
/// `release_transport` is the pipeline's own disconnect cleanup (sockets and
/// other transport-level resources); errors from it are logged and swallowed
/// by the controller, never propagated.
///
/// 控制器用来发出生命周期事件并获取配置的每连接句柄。
///
/// `release_transport` 是流水线自身的断开清理（套接字等传输级资源）；
/// 它返回的错误由控制器记录并吞掉，绝不向外传播。
pub trait PipelineContext: Send + Sync {
    /// The bound on the initial transport-connect attempt.
    /// 初始传输连接尝试的时限。
    fn connect_timeout(&self) -> Duration;

    /// Notifies the pipeline that the connection went active.
    /// 通知流水线连接已进入活动状态。
    fn fire_active(&self);

    /// Notifies the pipeline that the connection became inactive.
    /// 通知流水线连接已变为非活动。
    fn fire_inactive(&self);

    /// Releases transport-level resources held by the pipeline.
    /// 释放流水线持有的传输级资源。
    fn release_transport(&self) -> Result<()> {
        Ok(())
    }
}

/// A channel-backed [`PipelineContext`] delivering events on an `mpsc`
/// receiver.
///
/// 基于通道的 [`PipelineContext`]，通过 `mpsc` 接收端投递事件。
#[derive(Debug)]
pub struct EventPipeline {
    connect_timeout: Duration,
    events: mpsc::Sender<PipelineEvent>,
}

impl EventPipeline {
    /// Creates the context and the receiver for its events.
    /// 创建上下文及其事件接收端。
    pub fn new(connect_timeout: Duration) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (events, rx) = mpsc::channel(16);
        (
            Self {
                connect_timeout,
                events,
            },
            rx,
        )
    }

    fn emit(&self, event: PipelineEvent) {
        if let Err(e) = self.events.try_send(event) {
            warn!(event = ?e.into_inner(), "pipeline event dropped");
        }
    }
}

impl PipelineContext for EventPipeline {
    fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    fn fire_active(&self) {
        self.emit(PipelineEvent::Active);
    }

    fn fire_inactive(&self) {
        self.emit(PipelineEvent::Inactive);
    }
}
