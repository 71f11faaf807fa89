#![deny(clippy::expect_used, clippy::unwrap_used)]

//! The root of the secure-transport subsystem connector library.
//! 安全传输子系统连接器库的根。

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pipeline;
pub mod promise;
pub mod session;
pub mod writer;
