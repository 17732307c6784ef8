// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Supervisor/worker frame protocol.
//!
//! Frames travel over the worker's stdin and stdout:
//!
//! ```text
//! +----------------+----------------+------------------+
//! | length (4 LE)  | crc32 (4 LE)   | JSON payload     |
//! +----------------+----------------+------------------+
//! ```
//!
//! Checksums are verified on every read; a mismatch is fatal for the
//! connection and surfaces as a crash of the in-flight item.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FrameError, WorkError};

/// Maximum frame payload (16 MB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Messages sent from the supervisor to a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupervisorMessage {
    /// Run the unit on one input
    Task {
        id: u64,
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Finish the current loop and exit
    Shutdown,
}

/// Messages sent from a worker to the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// First frame after startup; names the unit being served
    Hello { unit: String, pid: u32 },
    /// Result for a previously sent task
    Done {
        id: u64,
        output: Result<Value, WorkError>,
    },
}

/// Encode and write one frame, then flush.
pub fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    W: Write,
    T: Serialize,
{
    let payload = serde_json::to_vec(message)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(FrameError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let checksum = crc32fast::hash(&payload);
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(&checksum.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read and decode one frame.
///
/// Returns [`FrameError::EndOfStream`] when the peer closed the pipe cleanly
/// between frames.
pub fn read_frame<R, T>(reader: &mut R) -> Result<T, FrameError>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut header = [0u8; 8];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(FrameError::EndOfStream);
        }
        Err(e) => return Err(FrameError::Io(e)),
    }

    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    if len > MAX_FRAME_SIZE {
        return Err(FrameError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    if len == 0 {
        return Err(FrameError::InvalidFrame {
            reason: "zero-length frame".to_string(),
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    let actual = crc32fast::hash(&payload);
    if actual != expected {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    Ok(serde_json::from_slice(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_roundtrip() {
        let mut buf = Vec::new();
        let sent = SupervisorMessage::Task {
            id: 3,
            input: serde_json::json!(112272535095293u64),
            timeout_ms: Some(500),
        };
        write_frame(&mut buf, &sent).unwrap();
        write_frame(&mut buf, &SupervisorMessage::Shutdown).unwrap();

        let mut cursor = Cursor::new(buf);
        let first: SupervisorMessage = read_frame(&mut cursor).unwrap();
        let second: SupervisorMessage = read_frame(&mut cursor).unwrap();
        assert_eq!(first, sent);
        assert_eq!(second, SupervisorMessage::Shutdown);
        assert!(matches!(
            read_frame::<_, SupervisorMessage>(&mut cursor),
            Err(FrameError::EndOfStream)
        ));
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let mut buf = Vec::new();
        write_frame(
            &mut buf,
            &WorkerMessage::Hello {
                unit: "primes".to_string(),
                pid: 42,
            },
        )
        .unwrap();
        let last = buf.len() - 2;
        buf[last] ^= 0xFF;

        let result: Result<WorkerMessage, _> = read_frame(&mut Cursor::new(buf));
        assert!(matches!(result, Err(FrameError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_SIZE as u32 + 1).to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());

        let result: Result<WorkerMessage, _> = read_frame(&mut Cursor::new(buf));
        assert!(matches!(result, Err(FrameError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_done_carries_work_error() {
        let mut buf = Vec::new();
        let sent = WorkerMessage::Done {
            id: 9,
            output: Err(WorkError::failed("connection refused")),
        };
        write_frame(&mut buf, &sent).unwrap();

        let received: WorkerMessage = read_frame(&mut Cursor::new(buf)).unwrap();
        assert_eq!(received, sent);
    }

    #[test]
    fn test_truncated_payload_is_io_error() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &SupervisorMessage::Shutdown).unwrap();
        buf.truncate(buf.len() - 1);

        let result: Result<SupervisorMessage, _> = read_frame(&mut Cursor::new(buf));
        assert!(matches!(result, Err(FrameError::Io(_))));
    }
}
