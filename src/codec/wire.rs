//! Binary wire format.
//!
//! All integers are 32-bit unsigned little-endian.
//!
//! ```text
//! request:  [nodes][arcs] then arcs x [tail][head]   (1-based ids)
//! response: [status] then UTF-8 body until end of stream
//! ```
//!
//! Status `0` means the ranking ran and the body is the report; any other
//! status carries a diagnostic body.

use std::io::{self, Read, Write};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{RankError, Result, STATUS_OK};
use crate::types::Submission;

/// Size of the request header in bytes
pub const HEADER_LEN: usize = 8;
/// Size of one encoded arc in bytes
pub const ARC_LEN: usize = 8;

/// Upper bound on arcs preallocated from an untrusted header
const PREALLOC_ARCS: usize = 1 << 20;

/// The fixed request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub nodes: u32,
    pub arcs: u32,
}

impl RequestHeader {
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[..4].copy_from_slice(&self.nodes.to_le_bytes());
        buf[4..].copy_from_slice(&self.arcs.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: [u8; HEADER_LEN]) -> Self {
        Self {
            nodes: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            arcs: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }
}

fn decode_arc(buf: [u8; ARC_LEN]) -> (u32, u32) {
    (
        u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
        u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
    )
}

fn truncated_or_io(err: io::Error, expected: usize, received: usize) -> RankError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        RankError::Truncated { expected, received }
    } else {
        RankError::Io(err)
    }
}

/// Encode a submission as a request frame.
pub fn encode_request(submission: &Submission) -> Vec<u8> {
    let header = RequestHeader {
        nodes: submission.declared_nodes,
        arcs: submission.arcs.len() as u32,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + submission.arcs.len() * ARC_LEN);
    out.extend_from_slice(&header.to_bytes());
    for &(tail, head) in &submission.arcs {
        out.extend_from_slice(&tail.to_le_bytes());
        out.extend_from_slice(&head.to_le_bytes());
    }
    out
}

/// Write a request frame.
pub fn write_request<W: Write>(writer: &mut W, submission: &Submission) -> Result<()> {
    writer.write_all(&encode_request(submission))?;
    writer.flush()?;
    Ok(())
}

/// Read a request frame.
///
/// Fails with [`RankError::Truncated`] when the stream ends before the
/// declared number of arcs arrived.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Submission> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    let header = RequestHeader::from_bytes(header);

    let expected = header.arcs as usize;
    let mut arcs = Vec::with_capacity(expected.min(PREALLOC_ARCS));
    let mut buf = [0u8; ARC_LEN];
    while arcs.len() < expected {
        reader
            .read_exact(&mut buf)
            .map_err(|e| truncated_or_io(e, expected, arcs.len()))?;
        arcs.push(decode_arc(buf));
    }

    Ok(Submission::one_based(header.nodes, arcs))
}

/// Async counterpart of [`read_request`].
pub async fn read_request_async<R>(reader: &mut R) -> Result<Submission>
where
    R: AsyncRead + Unpin,
{
    let nodes = reader.read_u32_le().await?;
    let expected = reader.read_u32_le().await? as usize;

    let mut arcs = Vec::with_capacity(expected.min(PREALLOC_ARCS));
    let mut buf = [0u8; ARC_LEN];
    while arcs.len() < expected {
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|e| truncated_or_io(e, expected, arcs.len()))?;
        arcs.push(decode_arc(buf));
    }

    Ok(Submission::one_based(nodes, arcs))
}

/// Async counterpart of [`write_request`].
pub async fn write_request_async<W>(writer: &mut W, submission: &Submission) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_request(submission)).await?;
    writer.flush().await?;
    Ok(())
}

/// A response frame: status code plus text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u32,
    pub body: String,
}

impl Response {
    /// A successful response carrying a report.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            body: body.into(),
        }
    }

    /// A failure response for `err`.
    pub fn failure(err: &RankError) -> Self {
        match err {
            RankError::Downstream { status, message } => Self {
                status: *status,
                body: message.clone(),
            },
            other => Self {
                status: other.status_code(),
                body: other.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.body.len());
        out.extend_from_slice(&self.status.to_le_bytes());
        out.extend_from_slice(self.body.as_bytes());
        out
    }

    /// Decode a complete response frame.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(RankError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "response shorter than its status code",
            )));
        }
        let status = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let body = String::from_utf8(bytes[4..].to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self { status, body })
    }

    /// Turn a non-zero status into [`RankError::Downstream`].
    pub fn into_result(self) -> Result<String> {
        if self.is_ok() {
            Ok(self.body)
        } else {
            Err(RankError::Downstream {
                status: self.status,
                message: self.body,
            })
        }
    }
}

/// Write a response frame.
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&response.encode())?;
    writer.flush()?;
    Ok(())
}

/// Read a response frame; the body runs to end of stream.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Response::decode(&bytes)
}

pub async fn write_response_async<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&response.encode()).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_response_async<R>(reader: &mut R) -> Result<Response>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Response::decode(&bytes)
}
