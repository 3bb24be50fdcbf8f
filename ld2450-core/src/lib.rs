//! # ld2450-core
//!
//! Core protocol implementation for HLK-LD2450 mmWave radar modules.
//!
//! This crate provides the low-level protocol primitives:
//! - Command and ACK frame encoding/decoding
//! - Telemetry frame decoding
//! - Accumulating decoder for the shared notification stream
//! - Link session state
//! - Protocol constants

pub mod ack;
pub mod command;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod session;
pub mod telemetry;

pub use ack::Ack;
pub use command::{Command, Opcode};
pub use decoder::{Decoded, FrameDecoder};
pub use error::{Error, Result};
pub use frame::{Direction, Frame};
pub use session::{LinkState, Session};
