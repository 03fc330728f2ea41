//! Packet encoding and decoding for the radio link.
//!
//! Packet format:
//! - SYNC (1 byte): 0xF5 marker, lets the receiver find the packet start
//! - LENGTH (1 byte): payload length (0-32)
//! - PAYLOAD (0-32 bytes): application data
//! - CRC (1 byte): CRC-8 of LENGTH and all PAYLOAD bytes

use heapless::Vec;

use crate::crc::{crc8, crc8_update};

/// Packet synchronization byte (`0b1111_0101`)
pub const SYNC_WORD: u8 = 0b1111_0101;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Maximum complete packet size (SYNC + LENGTH + MAX_PAYLOAD + CRC)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during packet parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Check code mismatch
    InvalidCrc,
    /// Length byte out of range
    InvalidLength,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Packet {
    /// Create a new packet with the given payload
    pub fn new(payload: &[u8]) -> Result<Self, PacketError> {
        let payload = Vec::from_slice(payload).map_err(|_| PacketError::PayloadTooLarge)?;
        Ok(Self { payload })
    }

    /// Check code over the length byte and payload
    fn checksum(length: u8, payload: &[u8]) -> u8 {
        crc8_update(crc8(&[length]), payload)
    }

    /// Size of this packet once encoded
    pub fn encoded_len(&self) -> usize {
        3 + self.payload.len()
    }

    /// Encode this packet into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(PacketError::BufferTooSmall);
        }

        let length = self.payload.len() as u8;
        let end = 2 + self.payload.len();

        buffer[0] = SYNC_WORD;
        buffer[1] = length;
        buffer[2..end].copy_from_slice(&self.payload);
        buffer[end] = Self::checksum(length, &self.payload);

        Ok(frame_len)
    }

    /// Encode this packet into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, PacketError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| PacketError::BufferTooSmall)
    }
}

/// State machine for parsing received packets
#[derive(Debug, Clone)]
pub struct PacketParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for SYNC byte
    WaitingForSync,
    /// Got SYNC, waiting for LENGTH
    WaitingForLength,
    /// Reading payload bytes
    ReadingPayload,
    /// Waiting for CRC
    WaitingForCrc,
}

impl Default for PacketParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketParser {
    /// Create a new packet parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForSync,
            buffer: Vec::new(),
            expected_length: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForSync;
        self.buffer.clear();
        self.expected_length = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(packet))` when a complete valid packet is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Packet>, PacketError> {
        match self.state {
            ParseState::WaitingForSync => {
                if byte == SYNC_WORD {
                    self.state = ParseState::WaitingForLength;
                }
                // Lead-in noise and garbage are skipped silently
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(PacketError::InvalidLength);
                }
                self.expected_length = byte;
                self.buffer.clear();
                self.state = if byte == 0 {
                    ParseState::WaitingForCrc
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Cannot overflow: expected_length <= MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForCrc;
                }
                Ok(None)
            }
            ParseState::WaitingForCrc => {
                let expected = Packet::checksum(self.expected_length, &self.buffer);
                if byte != expected {
                    self.reset();
                    return Err(PacketError::InvalidCrc);
                }

                let packet = Packet {
                    payload: self.buffer.clone(),
                };
                self.reset();
                Ok(Some(packet))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete packet found, if any.
    /// Remaining bytes after a complete packet are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Packet>, PacketError> {
        for &byte in bytes {
            if let Some(packet) = self.feed(byte)? {
                return Ok(Some(packet));
            }
        }
        Ok(None)
    }
}
