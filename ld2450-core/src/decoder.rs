//! Accumulating frame decoder
//!
//! ACKs and telemetry share one notification stream and arrive in chunks of
//! any size, so a chunk may hold part of a frame or several frames. Bytes are
//! appended to a buffer and every complete frame is drained in arrival order.
//!
//! Every recognised frame is consumed, ACKs included, and bytes that cannot
//! start a frame are dropped. An incomplete frame at the tail stays buffered
//! until the next chunk.

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use ld2450_types::TargetState;

use crate::{
    ack::Ack,
    constants::{FRAME_HEADER, FRAME_TRAILER, MAX_ACK_LEN, TELEMETRY_FRAME_SIZE, TELEMETRY_HEADER, TELEMETRY_TRAILER},
    frame::Frame,
    telemetry,
};

/// A frame recognised in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Ack(Ack),
    Telemetry(TargetState),
}

/// Outcome of trying to parse a frame at one buffer position
enum Scan {
    /// Frame (if understood) and the number of bytes it spans
    Frame(Option<Decoded>, usize),
    /// Could be a frame, more bytes needed
    Incomplete,
    /// Not a frame start
    Noise,
}

/// Accumulating decoder for the notification stream
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Initial buffer capacity (a few frames)
    pub const INITIAL_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(Self::INITIAL_CAPACITY),
        }
    }

    /// Append a received chunk
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Remove and return every complete frame in the buffer
    pub fn drain(&mut self) -> Vec<Decoded> {
        let mut decoded = Vec::new();
        let mut pos = 0;

        while pos < self.buffer.len() {
            match scan(&self.buffer[pos..]) {
                Scan::Frame(frame, len) => {
                    decoded.extend(frame);
                    pos += len;
                }
                Scan::Incomplete => break,
                Scan::Noise => pos += 1,
            }
        }

        if pos > 0 {
            trace!(consumed = pos, remaining = self.buffer.len() - pos, "Advancing frame buffer");
            self.buffer.advance(pos);
        }

        decoded
    }

    /// Append a chunk and drain everything it completes
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        self.push(chunk);
        self.drain()
    }

    /// Number of buffered bytes not yet consumed
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes not yet consumed
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// True if `buf` starts with `marker`, or is a truncated prefix of it
fn starts_with_partial(buf: &[u8], marker: &[u8]) -> bool {
    let n = buf.len().min(marker.len());
    buf[..n] == marker[..n]
}

fn scan(buf: &[u8]) -> Scan {
    if starts_with_partial(buf, &TELEMETRY_HEADER) {
        return scan_telemetry(buf);
    }
    if starts_with_partial(buf, &FRAME_HEADER) {
        return scan_ack(buf);
    }
    Scan::Noise
}

fn scan_telemetry(buf: &[u8]) -> Scan {
    if buf.len() < TELEMETRY_FRAME_SIZE {
        return Scan::Incomplete;
    }

    let frame = &buf[..TELEMETRY_FRAME_SIZE];
    if !frame.ends_with(&TELEMETRY_TRAILER) {
        return Scan::Noise;
    }

    match telemetry::decode(frame) {
        Ok(state) => Scan::Frame(Some(Decoded::Telemetry(state)), TELEMETRY_FRAME_SIZE),
        Err(e) => {
            debug!("Dropping telemetry frame: {}", e);
            Scan::Frame(None, TELEMETRY_FRAME_SIZE)
        }
    }
}

fn scan_ack(buf: &[u8]) -> Scan {
    let Some(size) = Frame::declared_size(buf) else {
        return Scan::Incomplete;
    };

    let data_len = size - Frame::PREFIX_SIZE - FRAME_TRAILER.len();
    if data_len < Frame::OPCODE_SIZE || data_len > MAX_ACK_LEN as usize {
        return Scan::Noise;
    }
    if buf.len() < size {
        return Scan::Incomplete;
    }

    let bytes = &buf[..size];
    if !bytes.ends_with(&FRAME_TRAILER) {
        return Scan::Noise;
    }

    let ack = Frame::decode(bytes).and_then(|frame| Ack::from_frame(&frame));
    match ack {
        Ok(ack) => Scan::Frame(Some(Decoded::Ack(ack)), size),
        Err(e) => {
            debug!("Skipping unrecognised ACK {}: {}", hex::encode(bytes), e);
            Scan::Frame(None, size)
        }
    }
}
