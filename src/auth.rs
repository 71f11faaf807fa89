//! The authentication seam.
//!
//! Credential storage and the concrete mechanism (password, public key, ...)
//! live behind this trait; the lifecycle controller only needs an
//! asynchronous authentication result for an established session.
//!
//! 认证接缝。
//!
//! 凭据存储和具体机制（密码、公钥等）位于此trait之后；
//! 生命周期控制器只需要一个针对已建立会话的异步认证结果。

use crate::error::Result;
use crate::session::SecureSession;
use async_trait::async_trait;
use std::sync::Arc;

/// Supplies the principal identifier and drives one authentication attempt.
///
/// A provider that fails while *starting* the attempt reports that through
/// the same `Err` path as an attempt that fails later; the controller wraps
/// both identically.
///
/// 提供主体标识并驱动一次认证尝试。
///
/// 在*启动*认证时失败的提供者与稍后失败的认证走同一条 `Err` 路径；
/// 控制器对两者的包装方式相同。
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The principal (user) name to connect as.
    /// 用于连接的主体（用户）名。
    fn principal(&self) -> &str;

    /// Authenticates the given established session.
    /// 对给定的已建立会话进行认证。
    async fn authenticate(&self, session: Arc<dyn SecureSession>) -> Result<()>;
}
