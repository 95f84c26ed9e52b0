//! Processing status for callers that drive the pipeline.
//!
//! State Machine:
//! - **Idle**: no image selected, or the previous result was dismissed
//! - **Loading**: decode and composite in progress
//! - **Success** / **Error**: outcome of the latest request
//!
//! Starting a new request supersedes any request still in flight. Each
//! request gets a [`RequestTicket`]; finishing with a ticket from an older
//! generation is ignored, so a slow stale result never overwrites a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Pipeline status as seen by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessingStatus {
    Idle = 0,
    Loading = 1,
    Success = 2,
    Error = 3,
}

impl From<u8> for ProcessingStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => ProcessingStatus::Loading,
            2 => ProcessingStatus::Success,
            3 => ProcessingStatus::Error,
            _ => ProcessingStatus::Idle,
        }
    }
}

impl ProcessingStatus {
    /// Whether `self -> next` is a legal transition.
    ///
    /// Any state may go back to idle or start loading; only a load can
    /// finish.
    pub fn can_transition_to(self, next: ProcessingStatus) -> bool {
        match next {
            ProcessingStatus::Idle | ProcessingStatus::Loading => true,
            ProcessingStatus::Success | ProcessingStatus::Error => {
                self == ProcessingStatus::Loading
            }
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Success | ProcessingStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStatus::Idle => "idle",
            ProcessingStatus::Loading => "loading",
            ProcessingStatus::Success => "success",
            ProcessingStatus::Error => "error",
        }
    }
}

/// Identifies one request. Only the newest ticket can finish it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

const STATE_BITS: u32 = 8;
const STATE_MASK: u64 = (1 << STATE_BITS) - 1;
const GENERATION_MASK: u64 = u64::MAX >> STATE_BITS;

/// Generation in the high 56 bits, status in the low 8.
fn pack(generation: u64, status: ProcessingStatus) -> u64 {
    ((generation & GENERATION_MASK) << STATE_BITS) | status as u64
}

fn unpack(word: u64) -> (u64, ProcessingStatus) {
    (word >> STATE_BITS, ((word & STATE_MASK) as u8).into())
}

/// Shared, lock-free status holder.
///
/// Status and generation live in one atomic word, so a result is checked
/// against the current request and recorded in a single compare-and-swap.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    word: Arc<AtomicU64>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ProcessingStatus {
        unpack(self.word.load(Ordering::Acquire)).1
    }

    /// Current request generation. Zero before the first request.
    pub fn generation(&self) -> u64 {
        unpack(self.word.load(Ordering::Acquire)).0
    }

    /// Whether the latest request has an outcome.
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Move to `next` under a new generation, returning that generation.
    fn advance(&self, next: ProcessingStatus) -> u64 {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let (generation, status) = unpack(current);
            let generation = (generation + 1) & GENERATION_MASK;
            debug_assert!(status.can_transition_to(next));
            match self.word.compare_exchange_weak(
                current,
                pack(generation, next),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return generation,
                Err(actual) => current = actual,
            }
        }
    }

    /// Start a new request, superseding any in flight.
    pub fn begin(&self) -> RequestTicket {
        let generation = self.advance(ProcessingStatus::Loading);
        debug!(generation = generation, "Processing started");
        RequestTicket { generation }
    }

    /// Record the outcome of a request.
    ///
    /// Returns `false`, leaving the status untouched, when the ticket has
    /// been superseded, the tracker was reset meanwhile, or the request
    /// already finished.
    pub fn finish(&self, ticket: RequestTicket, success: bool) -> bool {
        let next = if success {
            ProcessingStatus::Success
        } else {
            ProcessingStatus::Error
        };

        let swapped = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (generation, status) = unpack(word);
                (generation == ticket.generation && status.can_transition_to(next))
                    .then(|| pack(generation, next))
            });

        match swapped {
            Ok(_) => {
                debug!(generation = ticket.generation, status = next.as_str(), "Processing finished");
                true
            }
            Err(word) => {
                let (generation, status) = unpack(word);
                if generation != ticket.generation {
                    debug!(
                        generation = ticket.generation,
                        current = generation,
                        "Discarding stale result"
                    );
                } else if status.is_terminal() {
                    debug!(generation = generation, status = status.as_str(), "Request already finished");
                }
                false
            }
        }
    }

    /// Return to idle and invalidate any request in flight.
    pub fn reset(&self) {
        let generation = self.advance(ProcessingStatus::Idle);
        debug!(generation = generation, "Processing reset");
    }
}
