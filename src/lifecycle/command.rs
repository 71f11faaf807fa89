//! The serialized event stream driving a lifecycle controller.
//!
//! 驱动生命周期控制器的串行化事件流。

use crate::error::{Error, Result};
use crate::promise::Promise;
use crate::session::SecureSession;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;

/// Every input of a controller instance, whether an API call from the
/// pipeline or the completion of an asynchronous stage.
///
/// Routing all of these through one queue serializes state mutation: callbacks
/// may originate on arbitrary worker threads, but the controller observes
/// them one at a time.
///
/// 控制器实例的全部输入，无论是来自流水线的API调用还是某个异步阶段的
/// 完成。把它们全部路由到同一个队列使状态变更串行化：回调可能来自任意
/// 工作线程，但控制器一次只观察一个。
pub enum ControllerEvent {
    /// Begin the connect sequence towards the remote address.
    /// 开始针对远端地址的连接流程。
    Connect {
        remote_addr: SocketAddr,
        promise: Promise,
    },
    /// Write one outbound protocol message.
    /// 写出一条出站协议消息。
    Write { data: Bytes, promise: Promise },
    /// Application-initiated close or disconnect. Both funnel into the same
    /// teardown.
    /// 应用发起的关闭或断开。两者汇入同一个拆除流程。
    Close { promise: Promise },
    /// The transport-connect stage completed.
    /// 传输连接阶段完成。
    ConnectComplete(Result<Arc<dyn SecureSession>>),
    /// The authentication stage completed.
    /// 认证阶段完成。
    AuthComplete(Result<()>),
    /// The subsystem-channel open stage completed.
    /// 子系统通道打开阶段完成。
    OpenComplete(Result<()>),
    /// The externally supplied negotiation future completed.
    /// 外部提供的协商future完成。
    NegotiationComplete(Result<()>),
    /// The remote side closed the subsystem channel.
    /// 远端关闭了子系统通道。
    RemoteClosed,
}

impl ControllerEvent {
    /// A short name for logging.
    /// 用于日志的简短名称。
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Write { .. } => "write",
            Self::Close { .. } => "close",
            Self::ConnectComplete(_) => "connect-complete",
            Self::AuthComplete(_) => "auth-complete",
            Self::OpenComplete(_) => "open-complete",
            Self::NegotiationComplete(_) => "negotiation-complete",
            Self::RemoteClosed => "remote-closed",
        }
    }

    /// Resolves the event's promise, if any, the way a controller that has
    /// already torn down would: closes succeed (teardown is idempotent),
    /// everything else fails.
    ///
    /// 按照已完成拆除的控制器的方式解析事件携带的承诺（如果有）：
    /// 关闭成功（拆除是幂等的），其余全部失败。
    pub(crate) fn resolve_after_teardown(self) {
        match self {
            Self::Connect { promise, .. } => promise.fail(Error::ConnectionAborted),
            Self::Write { promise, .. } => promise.fail(Error::NotConnected),
            Self::Close { promise } => promise.succeed(),
            Self::ConnectComplete(Ok(session)) => {
                // The attempt lost a race against teardown; the session must
                // not leak.
                // 本次尝试在与拆除的竞争中落败；会话不能泄漏。
                tokio::spawn(async move {
                    let _ = session.close(true).await;
                });
            }
            _ => {}
        }
    }
}
