//! Content-Length framing for JSON-RPC over a byte stream

use crate::error::{SessionError, SessionResult};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single message body
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Write one framed message and flush
pub async fn write_message<W>(writer: &mut W, message: &Value) -> SessionResult<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(message).map_err(SessionError::transport)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer
        .write_all(header.as_bytes())
        .await
        .map_err(SessionError::transport)?;
    writer
        .write_all(&body)
        .await
        .map_err(SessionError::transport)?;
    writer.flush().await.map_err(SessionError::transport)
}

/// Read one framed message. `Ok(None)` on a clean end of stream.
pub async fn read_message<R>(reader: &mut R) -> SessionResult<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut saw_header = false;

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(SessionError::transport)?;
        if read == 0 {
            if saw_header {
                return Err(SessionError::transport("stream ended inside message headers"));
            }
            return Ok(None);
        }

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            if saw_header {
                break;
            }
            // Tolerate stray blank lines between messages
            continue;
        }
        saw_header = true;

        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let parsed = value.trim().parse::<usize>().map_err(|_| {
                    SessionError::transport(format!("invalid Content-Length: {}", value.trim()))
                })?;
                content_length = Some(parsed);
            }
        }
    }

    let length = content_length
        .ok_or_else(|| SessionError::transport("message without Content-Length header"))?;
    if length > MAX_BODY_BYTES {
        return Err(SessionError::transport(format!(
            "message of {length} bytes exceeds limit"
        )));
    }

    let mut body = vec![0u8; length];
    reader
        .read_exact(&mut body)
        .await
        .map_err(SessionError::transport)?;
    serde_json::from_slice(&body)
        .map(Some)
        .map_err(SessionError::transport)
}
