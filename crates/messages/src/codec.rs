//! Message encoding, decoding, and stream framing.
//!
//! # Wire Format
//!
//! ```text
//! frame   := varint(len) || body
//! request := request_id: u32 BE || inventory: N * 32 bytes
//! response:= request_id: u32 BE || votes: N bytes
//! ```
//!
//! The length prefix is an unsigned LEB128 varint. The entry count is implied
//! by the frame length: the remainder after the request id is either whole
//! 32-byte candidate ids (request) or one vote byte per candidate (response).

use crate::{PollRequest, PollResponse};
use bytes::{Buf, BufMut, BytesMut};
use snowfall_types::BlockId;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum number of candidate ids in a single poll.
pub const MAX_POLL_INVENTORY: usize = 4096;

/// Size of the candidate id portion of a request body.
const BLOCK_ID_LEN: usize = 32;

/// Size of the request id prefix in both bodies.
const REQUEST_ID_LEN: usize = 4;

/// Largest legal request frame body.
pub const MAX_REQUEST_FRAME: usize = REQUEST_ID_LEN + MAX_POLL_INVENTORY * BLOCK_ID_LEN;

/// Largest legal response frame body.
pub const MAX_RESPONSE_FRAME: usize = REQUEST_ID_LEN + MAX_POLL_INVENTORY;

/// Longest accepted varint length prefix (enough for any u32).
const MAX_VARINT_LEN: usize = 5;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: u64, max: usize },

    #[error("length prefix does not fit in {MAX_VARINT_LEN} bytes")]
    VarintOverflow,

    #[error("message body of {0} bytes is shorter than the request id")]
    BodyTooShort(usize),

    #[error("inventory bytes not a multiple of {BLOCK_ID_LEN}: {0}")]
    UnalignedInventory(usize),

    #[error("inventory of {0} entries exceeds limit of {MAX_POLL_INVENTORY}")]
    InventoryTooLarge(usize),
}

/// Encode a request body (no frame prefix).
pub fn encode_request(request: &PollRequest) -> Result<Vec<u8>, CodecError> {
    if request.inventory.len() > MAX_POLL_INVENTORY {
        return Err(CodecError::InventoryTooLarge(request.inventory.len()));
    }
    let mut buf =
        BytesMut::with_capacity(REQUEST_ID_LEN + request.inventory.len() * BLOCK_ID_LEN);
    buf.put_u32(request.request_id);
    for id in &request.inventory {
        buf.put_slice(id.as_bytes());
    }
    Ok(buf.to_vec())
}

/// Decode a request body.
pub fn decode_request(mut body: &[u8]) -> Result<PollRequest, CodecError> {
    if body.len() < REQUEST_ID_LEN {
        return Err(CodecError::BodyTooShort(body.len()));
    }
    let request_id = body.get_u32();
    if body.len() % BLOCK_ID_LEN != 0 {
        return Err(CodecError::UnalignedInventory(body.len()));
    }
    let count = body.len() / BLOCK_ID_LEN;
    if count > MAX_POLL_INVENTORY {
        return Err(CodecError::InventoryTooLarge(count));
    }
    let mut inventory = Vec::with_capacity(count);
    while body.has_remaining() {
        let mut id = [0u8; BLOCK_ID_LEN];
        body.copy_to_slice(&mut id);
        inventory.push(BlockId::new(id));
    }
    Ok(PollRequest {
        request_id,
        inventory,
    })
}

/// Encode a response body (no frame prefix).
pub fn encode_response(response: &PollResponse) -> Result<Vec<u8>, CodecError> {
    if response.votes.len() > MAX_POLL_INVENTORY {
        return Err(CodecError::InventoryTooLarge(response.votes.len()));
    }
    let mut buf = BytesMut::with_capacity(REQUEST_ID_LEN + response.votes.len());
    buf.put_u32(response.request_id);
    buf.put_slice(&response.votes);
    Ok(buf.to_vec())
}

/// Decode a response body.
pub fn decode_response(mut body: &[u8]) -> Result<PollResponse, CodecError> {
    if body.len() < REQUEST_ID_LEN {
        return Err(CodecError::BodyTooShort(body.len()));
    }
    let request_id = body.get_u32();
    if body.len() > MAX_POLL_INVENTORY {
        return Err(CodecError::InventoryTooLarge(body.len()));
    }
    Ok(PollResponse {
        request_id,
        votes: body.to_vec(),
    })
}

/// Write an unsigned LEB128 varint.
async fn write_varint<W: AsyncWrite + Unpin>(writer: &mut W, mut value: u64) -> std::io::Result<()> {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_u8(byte).await?;
        if value == 0 {
            return Ok(());
        }
    }
}

/// Read an unsigned LEB128 varint, bounded to u32 range.
async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u64, CodecError> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = reader.read_u8().await?;
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarintOverflow)
}

/// Write a length-prefixed frame.
async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, body: &[u8]) -> Result<(), CodecError> {
    write_varint(writer, body.len() as u64).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-prefixed frame, rejecting frames over `max_len`.
///
/// Frame-level errors (I/O, oversize, bad varint) poison the stream; body
/// decode errors do not, which is why framing and decoding are separate.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> Result<Vec<u8>, CodecError> {
    let len = read_varint(reader).await?;
    if len > max_len as u64 {
        return Err(CodecError::FrameTooLarge { len, max: max_len });
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Write a framed request to a stream.
pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request: &PollRequest,
) -> Result<(), CodecError> {
    let body = encode_request(request)?;
    write_frame(writer, &body).await
}

/// Read a framed request from a stream.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<PollRequest, CodecError> {
    let body = read_frame(reader, MAX_REQUEST_FRAME).await?;
    decode_request(&body)
}

/// Write a framed response to a stream.
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &PollResponse,
) -> Result<(), CodecError> {
    let body = encode_response(response)?;
    write_frame(writer, &body).await
}

/// Read a framed response from a stream.
pub async fn read_response<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<PollResponse, CodecError> {
    let body = read_frame(reader, MAX_RESPONSE_FRAME).await?;
    decode_response(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(count: usize) -> PollRequest {
        let inventory = (0..count)
            .map(|i| BlockId::new([i as u8; 32]))
            .collect();
        PollRequest::new(0xdead_beef, inventory)
    }

    #[test]
    fn test_request_round_trip() {
        let request = make_request(3);
        let body = encode_request(&request).unwrap();
        assert_eq!(body.len(), 4 + 3 * 32);
        assert_eq!(decode_request(&body).unwrap(), request);
    }

    #[test]
    fn test_empty_request_round_trip() {
        let request = make_request(0);
        let body = encode_request(&request).unwrap();
        assert_eq!(decode_request(&body).unwrap(), request);
    }

    #[test]
    fn test_response_round_trip() {
        let response = PollResponse::new(42, vec![0x01, 0x00, 0x80]);
        let body = encode_response(&response).unwrap();
        assert_eq!(decode_response(&body).unwrap(), response);
    }

    #[test]
    fn test_decode_rejects_short_body() {
        assert!(matches!(
            decode_request(&[0u8; 3]),
            Err(CodecError::BodyTooShort(3))
        ));
        assert!(matches!(
            decode_response(&[0u8; 2]),
            Err(CodecError::BodyTooShort(2))
        ));
    }

    #[test]
    fn test_decode_rejects_unaligned_inventory() {
        let mut body = encode_request(&make_request(1)).unwrap();
        body.push(0xff);
        assert!(matches!(
            decode_request(&body),
            Err(CodecError::UnalignedInventory(33))
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_inventory() {
        let request = make_request(MAX_POLL_INVENTORY + 1);
        assert!(matches!(
            encode_request(&request),
            Err(CodecError::InventoryTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_framed_request_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(MAX_REQUEST_FRAME + 8);
        let request = make_request(5);

        write_request(&mut client, &request).await.unwrap();
        let decoded = read_request(&mut server).await.unwrap();
        assert_eq!(decoded, request);
    }

    #[tokio::test]
    async fn test_framed_response_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let response = PollResponse::new(9, vec![0x01; 100]);

        write_response(&mut server, &response).await.unwrap();
        let decoded = read_response(&mut client).await.unwrap();
        assert_eq!(decoded, response);
    }

    #[tokio::test]
    async fn test_multiple_frames_on_one_stream() {
        let (mut client, mut server) = tokio::io::duplex(64 * 1024);

        for i in 0..3u32 {
            let request = PollRequest::new(i, vec![BlockId::new([i as u8; 32])]);
            write_request(&mut client, &request).await.unwrap();
        }
        for i in 0..3u32 {
            let decoded = read_request(&mut server).await.unwrap();
            assert_eq!(decoded.request_id, i);
        }
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);

        // Hand-write a frame header claiming a body far over the limit.
        write_varint(&mut client, (MAX_REQUEST_FRAME as u64) + 1)
            .await
            .unwrap();
        let err = read_frame(&mut server, MAX_REQUEST_FRAME).await.unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_varint_round_trip() {
        for value in [0u64, 1, 127, 128, 300, 16_383, 16_384, 131_076] {
            let (mut client, mut server) = tokio::io::duplex(16);
            write_varint(&mut client, value).await.unwrap();
            assert_eq!(read_varint(&mut server).await.unwrap(), value);
        }
    }

    #[tokio::test]
    async fn test_varint_overflow_rejected() {
        let (mut client, mut server) = tokio::io::duplex(16);
        client.write_all(&[0xff; 6]).await.unwrap();
        assert!(matches!(
            read_varint(&mut server).await,
            Err(CodecError::VarintOverflow)
        ));
    }
}
