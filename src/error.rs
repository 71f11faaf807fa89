//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use std::time::Duration;
use thiserror::Error;

/// The primary error type for the secure-transport connector library.
/// 安全传输连接器库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying transport I/O error occurred.
    /// 发生了底层传输的I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The initial transport connect did not complete within the
    /// caller-supplied bound.
    /// 初始传输连接未在调用方给定的时限内完成。
    #[error("Transport connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Authentication against the established session failed. The original
    /// cause is preserved, whether the provider failed while starting the
    /// attempt or the attempt itself failed later.
    ///
    /// 对已建立会话的认证失败。无论是提供者在启动认证时失败，
    /// 还是认证本身稍后失败，原始原因都会被保留。
    #[error("Authentication failed")]
    AuthenticationFailed(#[source] Box<Error>),

    /// The connection was torn down before the higher-level negotiation
    /// (or the setup sequence itself) ever completed.
    /// 连接在更高层协商（或建连流程本身）完成之前就被拆除了。
    #[error("Negotiation failed")]
    NegotiationFailed,

    /// The operation requires an active subsystem channel, but the
    /// connection never reached the active state.
    /// 操作需要一个活动的子系统通道，但连接从未进入活动状态。
    #[error("Connection not established")]
    NotConnected,

    /// The connection is closed or closing, or a second connect attempt was
    /// issued on a controller that is already past its idle state.
    /// 连接已关闭或正在关闭，或在已离开空闲状态的控制器上发起了第二次连接。
    #[error("Connection is closed or closing")]
    ConnectionAborted,

    /// A connect was requested through a transport runtime that has not
    /// been started by the application.
    /// 通过一个尚未被应用启动的传输运行时请求了连接。
    #[error("Transport client is not started")]
    ClientNotStarted,

    /// An internal channel for communication between tasks was closed
    /// unexpectedly.
    /// 用于任务间通信的内部通道意外关闭。
    #[error("Internal channel is broken")]
    ChannelClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::ConnectTimeout(_) => ErrorKind::TimedOut.into(),
            Error::AuthenticationFailed(_) => ErrorKind::PermissionDenied.into(),
            Error::NegotiationFailed => ErrorKind::ConnectionReset.into(),
            Error::NotConnected => ErrorKind::NotConnected.into(),
            Error::ConnectionAborted => ErrorKind::ConnectionAborted.into(),
            Error::ClientNotStarted => ErrorKind::NotConnected.into(),
            Error::ChannelClosed => ErrorKind::BrokenPipe.into(),
        }
    }
}
