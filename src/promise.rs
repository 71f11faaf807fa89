//! 单次完成承诺，保证恰好被解析一次。
//! One-shot completion promises, guaranteed to resolve exactly once.

use crate::error::{Error, Result};
use tokio::sync::oneshot;

/// The awaitable side of a [`Promise`].
///
/// Yields `Err(RecvError)` if the promise was dropped unresolved, which
/// callers should treat as a broken internal channel.
///
/// [`Promise`] 的可等待一侧。
///
/// 如果承诺在未解析的情况下被丢弃，会产生 `Err(RecvError)`，
/// 调用方应将其视为内部通道损坏。
pub type Completion = oneshot::Receiver<Result<()>>;

/// A one-shot completion handle.
///
/// Resolution consumes the promise, so "resolved at most once" is enforced by
/// the type system rather than by a runtime check.
///
/// 单次完成句柄。
///
/// 解析会消耗掉承诺本身，因此“至多解析一次”由类型系统而非运行时检查保证。
#[derive(Debug)]
pub struct Promise {
    tx: oneshot::Sender<Result<()>>,
}

impl Promise {
    /// Creates a promise together with its completion future.
    /// 创建一个承诺及其完成future。
    pub fn pair() -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Resolves the promise to success. The result is ignored if the
    /// awaiting side has gone away.
    /// 将承诺解析为成功。如果等待方已不存在，结果会被忽略。
    pub fn succeed(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Resolves the promise to failure with the given cause.
    /// 以给定原因将承诺解析为失败。
    pub fn fail(self, cause: Error) {
        let _ = self.tx.send(Err(cause));
    }
}
