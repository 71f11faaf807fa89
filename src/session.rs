//! Traits for abstracting over the secure-session library.
//!
//! The lifecycle controller only ever talks to the session library through
//! these seams, which keeps the controller testable with mock sessions and
//! keeps transport encryption internals out of this crate.
//!
//! 用于抽象安全会话库的trait。
//!
//! 生命周期控制器只通过这些接缝与会话库交互，这使得控制器可以用
//! 模拟会话进行测试，同时把传输加密的内部细节挡在本crate之外。

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWrite;

/// The asynchronous input stream of a subsystem channel, handed to the
/// outbound writer.
/// 子系统通道的异步输入流，交给出站写入器使用。
pub type ByteSink = Box<dyn AsyncWrite + Send + Unpin>;

/// A callback invoked when the remote side closes a subsystem channel.
/// 远端关闭子系统通道时调用的回调。
pub type CloseCallback = Box<dyn FnOnce() + Send>;

/// The streaming mode of a subsystem channel.
/// 子系统通道的流模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingMode {
    /// Blocking stream access.
    /// 阻塞式流访问。
    Sync,
    /// Asynchronous stream access. The controller always selects this mode
    /// before opening the channel.
    /// 异步流访问。控制器总是在打开通道之前选择此模式。
    Async,
}

/// An established secure-transport session.
///
/// 一个已建立的安全传输会话。
#[async_trait]
pub trait SecureSession: Send + Sync {
    /// Creates one multiplexed subsystem channel over this session. The
    /// channel is not yet open.
    /// 在此会话上创建一个多路复用的子系统通道。通道此时尚未打开。
    fn create_subsystem_channel(&self, name: &str) -> Result<Arc<dyn SubsystemChannel>>;

    /// Whether a close of this session is in progress.
    /// 此会话是否正在关闭中。
    fn is_closing(&self) -> bool;

    /// Whether this session is fully closed.
    /// 此会话是否已完全关闭。
    fn is_closed(&self) -> bool;

    /// Closes the session. A graceful close (`immediately == false`) returns
    /// `Ok(true)` only if closure completed; callers escalate to a forceful
    /// close when it did not.
    ///
    /// 关闭会话。优雅关闭（`immediately == false`）仅在关闭完成时返回
    /// `Ok(true)`；未完成时由调用方升级为强制关闭。
    async fn close(&self, immediately: bool) -> Result<bool>;
}

/// One multiplexed logical channel carrying the management-protocol byte
/// stream.
///
/// 承载管理协议字节流的一条多路复用逻辑通道。
#[async_trait]
pub trait SubsystemChannel: Send + Sync {
    /// Selects the streaming mode. Must be called before [`open`].
    /// 选择流模式。必须在 [`open`] 之前调用。
    ///
    /// [`open`]: SubsystemChannel::open
    fn set_streaming_mode(&self, mode: StreamingMode);

    /// Opens the channel over the session.
    /// 在会话上打开通道。
    async fn open(&self) -> Result<()>;

    /// Takes the channel's asynchronous input sink. Yields an error if the
    /// channel is not open or the sink was already taken.
    /// 取走通道的异步输入端。若通道未打开或输入端已被取走则返回错误。
    fn input_sink(&self) -> Result<ByteSink>;

    /// Registers a callback fired when the remote side closes the channel.
    /// 注册一个在远端关闭通道时触发的回调。
    fn on_close(&self, callback: CloseCallback);

    /// Closes the channel.
    /// 关闭通道。
    async fn close(&self) -> Result<()>;
}
