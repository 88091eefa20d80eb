//! Bounded single-producer / single-consumer queue of raw Mode S messages
//!
//! The ring holds `capacity + 1` fixed 14 byte slots so a full queue is
//! distinguishable from an empty one. Slot ownership moves between the two
//! sides purely by advancing the read and write indices, with no copy and
//! no lock: the producer fills the slot at `write` in place and publishes
//! it with a release store, the consumer reads the slot at `read` and frees
//! it the same way.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use skywatch::FRAME_BYTES;

/// One queue slot: a raw extended squitter.
pub type Message = [u8; FRAME_BYTES];

/// Messages the driver ring buffers before the parser starts dropping.
pub const DEFAULT_CAPACITY: usize = 32;

struct Ring {
    slots: Box<[UnsafeCell<Message>]>,
    read: AtomicUsize,
    write: AtomicUsize,
}

// The producer only touches the slot at `write`, which the consumer never
// reads before the release store in `commit`; the consumer only touches the
// slot at `read`, which the producer never reuses before the release store
// in `release`. Handing out at most one Producer and one Consumer is what
// makes this sound, and `channel` is the only constructor.
unsafe impl Sync for Ring {}

impl Ring {
    fn next(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }
}

/// Create a ring for `capacity` messages, split into its two endpoints.
#[must_use]
pub fn channel(capacity: usize) -> (Producer, Consumer) {
    let ring = Arc::new(Ring {
        slots: (0..=capacity).map(|_| UnsafeCell::new([0; FRAME_BYTES])).collect(),
        read: AtomicUsize::new(0),
        write: AtomicUsize::new(0),
    });
    (
        Producer {
            ring: Arc::clone(&ring),
        },
        Consumer { ring },
    )
}

/// Filling side of the ring, owned by the I/O thread.
pub struct Producer {
    ring: Arc<Ring>,
}

impl Producer {
    /// The slot at the write index, to be filled in place. None when the
    /// ring is full; the frame being assembled has to be dropped.
    ///
    /// Until [`commit`](Self::commit) the same slot is handed out again, so
    /// an abandoned frame costs nothing.
    pub fn write_slot(&mut self) -> Option<&mut Message> {
        let write = self.ring.write.load(Ordering::Relaxed);
        if self.ring.next(write) == self.ring.read.load(Ordering::Acquire) {
            return None;
        }
        Some(unsafe { &mut *self.ring.slots[write].get() })
    }

    /// Publish the filled write slot to the consumer.
    pub fn commit(&mut self) {
        let write = self.ring.write.load(Ordering::Relaxed);
        self.ring.write.store(self.ring.next(write), Ordering::Release);
    }
}

/// Draining side of the ring, owned by the decode thread.
pub struct Consumer {
    ring: Arc<Ring>,
}

impl Consumer {
    /// The slot at the read index, or None when the ring is empty.
    pub fn read_slot(&mut self) -> Option<&Message> {
        let read = self.ring.read.load(Ordering::Relaxed);
        if read == self.ring.write.load(Ordering::Acquire) {
            return None;
        }
        Some(unsafe { &*self.ring.slots[read].get() })
    }

    /// Hand the read slot back to the producer.
    pub fn release(&mut self) {
        let read = self.ring.read.load(Ordering::Relaxed);
        self.ring.read.store(self.ring.next(read), Ordering::Release);
    }

    /// Copy out the next message and free its slot.
    pub fn pop(&mut self) -> Option<Message> {
        let message = *self.read_slot()?;
        self.release();
        Some(message)
    }

    /// Drop everything currently queued.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}
