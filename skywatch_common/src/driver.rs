//! Receiver transport runtime
//!
//! A background thread keeps two fixed 64 byte buffers in flight against
//! the transport, runs every completed buffer through the framing parser
//! and hands the buffer straight back. The payload convention is that the
//! wire bytes are ASCII and never zero, so a completed buffer carries its
//! payload up to the first zero byte; the loop re-zeroes what it consumed
//! before resubmitting.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use crate::fifo::{self, Consumer, Message};
use crate::framing::FrameParser;

/// Transport read unit.
pub const READ_BUF_LEN: usize = 64;

/// Payload length above which the decode side is assumed to fall behind.
pub const READ_HIGH_WATER: usize = 32;

/// Buffers kept in flight against the transport.
const IN_FLIGHT: usize = 2;

pub type ReadBuffer = Box<[u8; READ_BUF_LEN]>;

/// Byte source feeding the driver, the only contract consumed from the
/// receiver hardware side.
pub trait Transport: Send {
    /// Queue a zeroed buffer for the next read.
    fn submit(&mut self, buf: ReadBuffer);

    /// Block until the oldest in-flight buffer completes. None means the
    /// endpoint has gone away and the driver should shut down.
    fn complete(&mut self) -> Option<ReadBuffer>;

    /// Handle able to unblock a pending [`complete`](Self::complete) from
    /// another thread.
    fn canceller(&self) -> Box<dyn Cancel>;
}

/// Teardown side of a [`Transport`].
pub trait Cancel: Send {
    fn cancel(&self);
}

/// Owns the I/O thread and the consuming end of the message FIFO.
pub struct Driver {
    running: Arc<AtomicBool>,
    canceller: Box<dyn Cancel>,
    handle: Option<JoinHandle<()>>,
    messages: Consumer,
}

impl Driver {
    /// Spawn the I/O thread over `transport`.
    pub fn start<T: Transport + 'static>(transport: T) -> Self {
        let (producer, consumer) = fifo::channel(fifo::DEFAULT_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let canceller = transport.canceller();

        let flag = Arc::clone(&running);
        let handle = std::thread::spawn(move || {
            io_loop(transport, FrameParser::new(producer), &flag);
        });

        Self {
            running,
            canceller,
            handle: Some(handle),
            messages: consumer,
        }
    }

    /// Copy of the next parsed message, or None when the queue is empty.
    ///
    /// The live slot is never handed out; the copy frees it immediately.
    pub fn read_next_message(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    /// Stop the I/O thread and tear down the transport. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.canceller.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn io_loop<T: Transport>(mut transport: T, mut parser: FrameParser, running: &AtomicBool) {
    for _ in 0..IN_FLIGHT {
        transport.submit(Box::new([0; READ_BUF_LEN]));
    }

    while running.load(Ordering::Relaxed) {
        let Some(mut buf) = transport.complete() else {
            debug!("transport gone, stopping");
            break;
        };
        let len = buf.iter().position(|&b| b == 0).unwrap_or(READ_BUF_LEN);
        if len > READ_HIGH_WATER {
            warn!("transport burst of {len} bytes, decoder may be falling behind");
        }
        for &byte in &buf[..len] {
            parser.feed(byte);
        }
        buf[..len].fill(0);
        transport.submit(buf);
    }
    // in-flight buffers are dropped with the transport
    debug!("io thread exiting");
}

/// [`Transport`] over a TCP demodulator feed such as dump1090's raw output
/// port.
pub struct TcpTransport {
    stream: TcpStream,
    pending: VecDeque<ReadBuffer>,
}

impl TcpTransport {
    pub fn connect(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        Ok(Self {
            stream,
            pending: VecDeque::with_capacity(IN_FLIGHT),
        })
    }
}

impl Transport for TcpTransport {
    fn submit(&mut self, buf: ReadBuffer) {
        self.pending.push_back(buf);
    }

    fn complete(&mut self) -> Option<ReadBuffer> {
        let mut buf = self.pending.pop_front()?;
        loop {
            match self.stream.read(&mut buf[..]) {
                Ok(0) => return None,
                Ok(_) => return Some(buf),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("transport read failed: {e}");
                    return None;
                }
            }
        }
    }

    fn canceller(&self) -> Box<dyn Cancel> {
        Box::new(TcpCancel(self.stream.try_clone().ok()))
    }
}

struct TcpCancel(Option<TcpStream>);

impl Cancel for TcpCancel {
    fn cancel(&self) {
        if let Some(stream) = &self.0 {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// [`Transport`] fed from an in-process channel; used by tests and replays.
///
/// Chunks longer than a read buffer are truncated; an empty chunk is the
/// teardown signal.
pub struct ChannelTransport {
    feed: Receiver<Vec<u8>>,
    cancel: Sender<Vec<u8>>,
    pending: VecDeque<ReadBuffer>,
}

impl ChannelTransport {
    /// The returned sender feeds payload chunks to the driver.
    #[must_use]
    pub fn new() -> (Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel();
        let transport = Self {
            feed: rx,
            cancel: tx.clone(),
            pending: VecDeque::with_capacity(IN_FLIGHT),
        };
        (tx, transport)
    }
}

impl Transport for ChannelTransport {
    fn submit(&mut self, buf: ReadBuffer) {
        self.pending.push_back(buf);
    }

    fn complete(&mut self) -> Option<ReadBuffer> {
        let mut buf = self.pending.pop_front()?;
        let chunk = self.feed.recv().ok()?;
        if chunk.is_empty() {
            return None;
        }
        if chunk.len() > READ_BUF_LEN {
            warn!("oversized chunk of {} bytes truncated", chunk.len());
        }
        let len = chunk.len().min(READ_BUF_LEN);
        buf[..len].copy_from_slice(&chunk[..len]);
        Some(buf)
    }

    fn canceller(&self) -> Box<dyn Cancel> {
        Box::new(ChannelCancel(self.cancel.clone()))
    }
}

struct ChannelCancel(Sender<Vec<u8>>);

impl Cancel for ChannelCancel {
    fn cancel(&self) {
        let _ = self.0.send(Vec::new());
    }
}
