//! The outbound writer that adapts pipeline writes onto the subsystem
//! channel's asynchronous input sink.
//!
//! 将流水线写入适配到子系统通道异步输入端的出站写入器。

use crate::error::Error;
use crate::promise::Promise;
use crate::session::ByteSink;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

struct WriteRequest {
    data: Bytes,
    promise: Promise,
}

/// Serializes outbound messages onto the channel's input sink.
///
/// Requests are queued and written one at a time by a dedicated task, so a
/// write issued while a previous write is still in flight never interleaves
/// with it. Each request's promise resolves once its bytes are flushed.
///
/// 将出站消息串行写入通道的输入端。
///
/// 请求被排队并由专用任务逐个写出，因此在上一次写入仍在进行时发出的
/// 写入不会与之交错。每个请求的承诺在其字节被刷出后解析。
pub struct OutboundWriter {
    tx: mpsc::Sender<WriteRequest>,
    task: JoinHandle<()>,
}

impl OutboundWriter {
    /// Takes ownership of the channel's input sink and starts the drain
    /// task.
    /// 接管通道的输入端并启动写出任务。
    pub fn new(mut sink: ByteSink, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<WriteRequest>(queue_capacity);
        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                trace!(len = request.data.len(), "writing outbound message");
                let outcome = async {
                    sink.write_all(&request.data).await?;
                    sink.flush().await
                }
                .await;
                match outcome {
                    Ok(()) => request.promise.succeed(),
                    Err(e) => {
                        debug!(error = %e, "outbound sink failed, stopping writer");
                        request.promise.fail(e.into());
                        // Queued requests are dropped; their promises break,
                        // which callers observe as a closed channel.
                        // 排队中的请求被丢弃；其承诺随之失效，
                        // 调用方会观察到通道已关闭。
                        break;
                    }
                }
            }
        });
        Self { tx, task }
    }

    /// Queues one outbound message. The promise fails immediately when the
    /// queue is full or the writer has stopped.
    /// 排队一条出站消息。当队列已满或写入器已停止时，承诺立即失败。
    pub fn write(&self, data: Bytes, promise: Promise) {
        use mpsc::error::TrySendError;
        match self.tx.try_send(WriteRequest { data, promise }) {
            Ok(()) => {}
            Err(TrySendError::Full(request)) | Err(TrySendError::Closed(request)) => {
                Self::reject(request);
            }
        }
    }

    /// Stops the drain task and releases any buffered write resources.
    /// 停止写出任务并释放所有缓冲的写资源。
    pub fn close(&self) {
        self.task.abort();
    }

    fn reject(request: WriteRequest) {
        request.promise.fail(Error::ChannelClosed);
    }
}
