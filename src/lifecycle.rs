//! The connection lifecycle controller: the actor, its event stream, and the
//! public handle.
//!
//! 连接生命周期控制器：actor、其事件流以及公共句柄。

pub(crate) mod command;
pub(crate) mod controller;
pub mod handle;

pub use handle::{LifecycleHandle, NegotiationFuture};
