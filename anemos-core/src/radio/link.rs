//! Foreground / tick-context handoff for the radio link
//!
//! A single slot holds at most one frame. An atomic tag says who may touch
//! it:
//!
//! | Tag       | Owner of the slot | Set by                         |
//! |-----------|-------------------|--------------------------------|
//! | `Idle`    | nobody            | tick context, after `Finished` |
//! | `Loading` | foreground        | `submit` (won the swap)        |
//! | `Armed`   | tick context      | `submit`, after the copy       |
//! | `Sending` | tick context      | `take_armed`                   |
//!
//! The slot itself sits behind a critical-section mutex so the copy in and
//! the take out are each atomic, but the tag alone decides whose turn it
//! is. A second `submit` while the tag is not `Idle` fails with
//! [`RadioError::Busy`] and never touches the slot, whatever its length.
//!
//! The tag shares one atomic word with the count of finished frames:
//!
//! ```text
//! 31                              2 1  0
//! ┌────────────────────────────────┬────┐
//! │ finished frames (30-bit, wraps)│ tag│
//! └────────────────────────────────┴────┘
//! ```
//!
//! Completion bumps the count and frees the slot in a single store, so a
//! caller that sees its frame finished also sees the link idle.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use anemos_protocol::{Packet, PacketError, MAX_FRAME_SIZE};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::AtomicWaker;
use heapless::Vec;
use portable_atomic::{AtomicU32, Ordering};

const IDLE: u8 = 0;
const LOADING: u8 = 1;
const ARMED: u8 = 2;
const SENDING: u8 = 3;

const TAG_MASK: u32 = 0b11;
const COUNT_SHIFT: u32 = 2;
const COUNT_MASK: u32 = u32::MAX >> COUNT_SHIFT;

const fn tag(word: u32) -> u8 {
    (word & TAG_MASK) as u8
}

const fn count(word: u32) -> u32 {
    word >> COUNT_SHIFT
}

const fn pack(count: u32, tag: u8) -> u32 {
    ((count & COUNT_MASK) << COUNT_SHIFT) | tag as u32
}

/// Ownership phase of the single frame slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No transmission in flight
    Idle,
    /// Foreground is copying a frame in
    Loading,
    /// Frame waiting for the next tick
    Armed,
    /// Tick context is sending the frame
    Sending,
}

impl LinkState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            LOADING => LinkState::Loading,
            ARMED => LinkState::Armed,
            SENDING => LinkState::Sending,
            _ => LinkState::Idle,
        }
    }
}

/// Errors from the radio link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// A transmission is already in flight
    Busy,
    /// Frame larger than the link's slot
    TooLong,
    /// Packet framing failed
    Packet(PacketError),
}

impl From<PacketError> for RadioError {
    fn from(e: PacketError) -> Self {
        RadioError::Packet(e)
    }
}

/// Completion ticket for a submitted frame
///
/// Holds the finished-frame count at which the frame is done; wraps with
/// the 30-bit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticket(u32);

/// Single-slot radio link shared by the foreground and the tick context
///
/// Meant to live in a `static`; every method takes `&self`.
pub struct RadioLink<const N: usize> {
    /// Slot tag and finished-frame count, see the module docs
    state: AtomicU32,
    slot: Mutex<CriticalSectionRawMutex, RefCell<Vec<u8, N>>>,
    waker: AtomicWaker,
}

impl<const N: usize> Default for RadioLink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RadioLink<N> {
    /// Create an idle link
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(pack(0, IDLE)),
            slot: Mutex::new(RefCell::new(Vec::new())),
            waker: AtomicWaker::new(),
        }
    }

    /// Current slot ownership phase
    pub fn state(&self) -> LinkState {
        LinkState::from_raw(tag(self.state.load(Ordering::Acquire)))
    }

    /// Check if a transmission is in flight
    pub fn is_busy(&self) -> bool {
        self.state() != LinkState::Idle
    }

    /// Copy `data` into the slot and arm it for the tick context
    ///
    /// Returns a ticket that completes when the frame has been sent. While
    /// a frame is in flight every submission fails with
    /// [`RadioError::Busy`], empty ones included. On an idle link an empty
    /// buffer returns a ticket that is already complete; nothing is armed.
    pub fn submit(&self, data: &[u8]) -> Result<Ticket, RadioError> {
        if data.len() > N {
            return Err(RadioError::TooLong);
        }

        let word = self.state.load(Ordering::Acquire);
        if tag(word) != IDLE {
            return Err(RadioError::Busy);
        }
        if data.is_empty() {
            return Ok(Ticket(count(word)));
        }

        // The count only moves while Sending, so a failed swap means
        // another submitter won
        self.state
            .compare_exchange(
                word,
                pack(count(word), LOADING),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .map_err(|_| RadioError::Busy)?;

        let ticket = Ticket(count(word).wrapping_add(1) & COUNT_MASK);

        let copied = self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            slot.clear();
            slot.extend_from_slice(data)
        });
        if copied.is_err() {
            self.state.store(word, Ordering::Release);
            return Err(RadioError::TooLong);
        }

        self.state.store(pack(count(word), ARMED), Ordering::Release);
        Ok(ticket)
    }

    /// Check if the frame behind `ticket` has been sent
    pub fn is_complete(&self, ticket: Ticket) -> bool {
        let finished = count(self.state.load(Ordering::Acquire));
        let behind = finished.wrapping_sub(ticket.0) & COUNT_MASK;
        behind <= COUNT_MASK / 2
    }

    /// Wait until the frame behind `ticket` has been sent
    ///
    /// The link keeps a single waker: only the task that polled last is
    /// woken, so each ticket should have one waiting task.
    pub async fn wait(&self, ticket: Ticket) {
        poll_fn(|cx| {
            self.waker.register(cx.waker());
            if self.is_complete(ticket) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Send a raw buffer and wait for completion
    ///
    /// Bytes go out unframed, MSB first, back to back after the lead-in.
    /// Fails with [`RadioError::Busy`] instead of touching a frame in flight.
    pub async fn transmit_buffer(&self, data: &[u8]) -> Result<(), RadioError> {
        let ticket = self.submit(data)?;
        self.wait(ticket).await;
        Ok(())
    }

    /// Send a raw buffer, spinning until completion
    ///
    /// For callers without a scheduler. Must not run on the tick context
    /// itself or at a priority that blocks it.
    pub fn transmit_buffer_blocking(&self, data: &[u8]) -> Result<(), RadioError> {
        let ticket = self.submit(data)?;
        while !self.is_complete(ticket) {
            core::hint::spin_loop();
        }
        Ok(())
    }

    /// Frame a payload as a packet and send it
    ///
    /// See `anemos_protocol::Packet` for the layout.
    pub async fn transmit_packet(&self, payload: &[u8]) -> Result<(), RadioError> {
        let packet = Packet::new(payload)?;
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = packet.encode(&mut buffer)?;
        self.transmit_buffer(&buffer[..len]).await
    }

    /// Take the armed frame, if any (tick context)
    pub(crate) fn take_armed(&self) -> Option<Vec<u8, N>> {
        let word = self.state.load(Ordering::Acquire);
        if tag(word) != ARMED {
            return None;
        }
        let frame = self
            .slot
            .lock(|slot| core::mem::take(&mut *slot.borrow_mut()));
        self.state.store(pack(count(word), SENDING), Ordering::Release);
        Some(frame)
    }

    /// Release the slot after a frame finished (tick context)
    pub(crate) fn complete(&self) {
        // Only the tick context writes while Sending
        let word = self.state.load(Ordering::Acquire);
        self.state.store(pack(count(word).wrapping_add(1), IDLE), Ordering::Release);
        self.waker.wake();
    }
}
