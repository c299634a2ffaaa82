//! Length-prefixed framing shared by the engine and its clients.
//!
//! Every message is `[u32 big-endian length][bytes]`. The engine opens each
//! connection with a [`GREETING`] frame.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{JobdexError, Result};

/// First frame the engine sends on every connection.
pub const GREETING: &str = "READY";

pub const FRAME_HEADER_LEN: usize = 4;

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| {
        JobdexError::Transport(format!("frame of {} bytes is too large", payload.len()))
    })?;
    writer.write_u32(len).await.map_err(transport_err)?;
    writer.write_all(payload).await.map_err(transport_err)?;
    writer.flush().await.map_err(transport_err)?;
    Ok(())
}

/// Read one frame of at most `max_len` bytes. `None` when the peer closed
/// the connection between frames.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(transport_err(err)),
    };
    if len > max_len {
        return Err(JobdexError::Transport(format!(
            "frame of {len} bytes exceeds limit of {max_len}"
        )));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(transport_err)?;
    Ok(Some(payload))
}

/// Read a frame and decode it as UTF-8 text.
pub async fn read_text_frame<R>(reader: &mut R, max_len: usize) -> Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    match read_frame(reader, max_len).await? {
        Some(payload) => String::from_utf8(payload)
            .map(Some)
            .map_err(|err| JobdexError::Transport(format!("frame is not UTF-8: {err}"))),
        None => Ok(None),
    }
}

fn transport_err(err: std::io::Error) -> JobdexError {
    JobdexError::Transport(err.to_string())
}
