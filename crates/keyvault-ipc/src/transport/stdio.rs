//! stdio transport for the IPC host

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::protocol::{IpcHandler, IpcRequest, IpcResponse};

/// Newline-delimited JSON over stdin/stdout
///
/// Requests are dispatched concurrently, so a request waiting on an
/// authentication prompt does not hold up the others. Responses carry the
/// request id and may arrive out of order.
pub struct StdioTransport {
    handler: Arc<IpcHandler>,
}

impl StdioTransport {
    pub fn new(handler: IpcHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Serve stdin until EOF
    pub async fn run(&self) -> io::Result<()> {
        info!("Starting IPC host on stdio");
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await?;
        Ok(())
    }

    /// Serve `reader` until EOF, writing responses to `writer`.
    ///
    /// In-flight requests are drained before returning the writer.
    pub async fn serve<R, W>(&self, mut reader: R, writer: W) -> io::Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_responses(rx, writer));
        let mut in_flight = JoinSet::new();
        let mut line = String::new();

        loop {
            line.clear();

            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Lines may carry secrets; only the channel is ever logged
            match serde_json::from_str::<IpcRequest>(trimmed) {
                Ok(request) => {
                    debug!("Received request on channel {}", request.channel);
                    let handler = self.handler.clone();
                    let tx = tx.clone();
                    in_flight.spawn(async move {
                        let response = handler.handle(request).await;
                        let _ = tx.send(response);
                    });
                }
                Err(e) => {
                    error!("Failed to parse request at line {}", e.line());
                    let _ = tx.send(IpcResponse::unparseable("Malformed request"));
                }
            }

            // Reap finished requests so the set does not grow unbounded
            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        drop(tx);

        writer_task
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<IpcResponse>,
    mut writer: W,
) -> io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let response_line = serde_json::to_string(&response)?;
        writer.write_all(response_line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(writer)
}
