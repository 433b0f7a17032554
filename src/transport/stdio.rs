//! Line-delimited JSON over stdio.
//!
//! Requests are dispatched concurrently; replies are written as they
//! complete, so callers should correlate them by `id`. On EOF the loop waits
//! for in-flight requests before returning.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::transport::{DispatchEnvelope, DispatchResponse, RequestId};

/// One inbound line.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Cancel { cancel: RequestId },
    Dispatch(DispatchEnvelope),
}

/// In-flight requests by id. The sequence number tells a finished request
/// whether the entry is still its own or belongs to a later request that
/// reused the id.
type InFlight = Arc<Mutex<HashMap<RequestId, (u64, CancellationToken)>>>;

/// Serve requests read from `input`, writing replies to `output`.
pub async fn serve<R, W>(dispatcher: Dispatcher, input: R, output: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<DispatchResponse>(100);
    let writer = tokio::spawn(write_responses(output, rx));

    let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));
    let mut tasks = JoinSet::new();
    let mut sequence: u64 = 0;
    let mut lines = LinesStream::new(BufReader::new(input).lines());

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Error reading input: {}", e);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        trace!("Received: {}", trimmed);

        let envelope = match serde_json::from_str::<Inbound>(trimmed) {
            Ok(Inbound::Cancel { cancel }) => {
                match in_flight.lock().await.remove(&cancel) {
                    Some((_, token)) => {
                        info!(request = %cancel, "Cancelling request");
                        token.cancel();
                    }
                    None => debug!(request = %cancel, "Cancel for unknown or finished request"),
                }
                continue;
            }
            Ok(Inbound::Dispatch(envelope)) => envelope,
            Err(e) => {
                warn!("Malformed request line: {}", e);
                let error = Error::InvalidArguments(format!("malformed request: {}", e));
                if tx.send(DispatchResponse::failure(None, &error)).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let format = match envelope.format_kind() {
            Ok(format) => format,
            Err(e) => {
                if tx.send(DispatchResponse::failure(envelope.id, &e)).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let (id, request) = envelope.into_request();
        let token = CancellationToken::new();
        if let Some(id) = &id {
            let mut active = in_flight.lock().await;
            if active.contains_key(id) {
                let error = Error::InvalidArguments(format!("request id {} is already in flight", id));
                drop(active);
                if tx.send(DispatchResponse::failure(Some(id.clone()), &error)).await.is_err() {
                    break;
                }
                continue;
            }
            sequence += 1;
            active.insert(id.clone(), (sequence, token.clone()));
        }
        let own_sequence = sequence;

        let dispatcher = dispatcher.clone();
        let in_flight = in_flight.clone();
        let tx = tx.clone();
        tasks.spawn(async move {
            let result = dispatcher.dispatch_with_cancel(request, format, token).await;
            if let Some(id) = &id {
                let mut active = in_flight.lock().await;
                if active.get(id).is_some_and(|(seq, _)| *seq == own_sequence) {
                    active.remove(id);
                }
            }
            if tx.send(DispatchResponse::from_result(id, result)).await.is_err() {
                error!("Failed to send response");
            }
        });
    }

    debug!("Input closed, waiting for {} in-flight requests", tasks.len());
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
    }

    drop(tx);
    writer
        .await
        .map_err(|e| Error::Internal(format!("Writer task failed: {}", e)))?
}

async fn write_responses<W>(mut output: W, mut rx: mpsc::Receiver<DispatchResponse>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_string(&response)?;
        trace!("Sending: {}", line);
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    output.shutdown().await?;
    Ok(())
}
