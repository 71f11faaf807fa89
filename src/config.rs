//! 定义了传输客户端和连接的可配置参数。
//! Defines configurable parameters for the transport client and connections.

use std::time::Duration;

/// A structure containing all configurable parameters.
///
/// 包含所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// Parameters of the shared transport client.
    /// 共享传输客户端的参数。
    pub client: ClientConfig,

    /// Per-connection parameters.
    /// 单个连接的参数。
    pub connection: ConnectionConfig,
}

/// Parameters of the process-wide transport client.
///
/// The timeouts default to disabled because timeout policy is owned by the
/// caller: the only bound the connector enforces itself is the per-attempt
/// connect timeout taken from the pipeline context.
///
/// 进程级传输客户端的参数。
///
/// 各超时默认禁用，因为超时策略由调用方负责：连接器自己唯一施加的时限
/// 是来自流水线上下文的单次连接超时。
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The number of I/O worker threads the transport client may use.
    /// 传输客户端可使用的I/O工作线程数量。
    pub worker_threads: usize,
    /// Authentication timeout of the underlying session library. `None`
    /// disables it.
    /// 底层会话库的认证超时。`None` 表示禁用。
    pub auth_timeout: Option<Duration>,
    /// Idle timeout of the underlying session library. `None` disables it.
    /// 底层会话库的空闲超时。`None` 表示禁用。
    pub idle_timeout: Option<Duration>,
    /// Read timeout of the underlying session library. `None` disables it.
    /// 底层会话库的读超时。`None` 表示禁用。
    pub read_timeout: Option<Duration>,
    /// Enables the low-latency (no-delay) socket option on transport
    /// sockets.
    /// 在传输套接字上启用低延迟（no-delay）选项。
    pub tcp_nodelay: bool,
}

/// Per-connection parameters.
///
/// 单个连接的参数。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// The name of the subsystem channel opened over the session. The
    /// management protocol is carried on this channel.
    /// 在会话上打开的子系统通道的名称。管理协议承载在该通道上。
    pub subsystem: String,
    /// The capacity of the controller's serialized event queue.
    /// 控制器串行化事件队列的容量。
    pub event_queue_capacity: usize,
    /// The capacity of the outbound writer's pending-write queue.
    /// 出站写入器待写队列的容量。
    pub write_queue_capacity: usize,
    /// The bound on a single transport-connect attempt, used by the
    /// channel-backed pipeline context.
    /// 单次传输连接尝试的时限，由基于通道的流水线上下文使用。
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            worker_threads: 8,
            auth_timeout: None,
            idle_timeout: None,
            read_timeout: None,
            tcp_nodelay: true,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            subsystem: "netconf".to_owned(),
            event_queue_capacity: 32,
            write_queue_capacity: 64,
            connect_timeout: Duration::from_secs(20),
        }
    }
}
