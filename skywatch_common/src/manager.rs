//! Decode thread tying the driver to the plane database
//!
//! The manager owns the only mutating reference to [`Planes`]: it drains
//! the driver queue under the database mutex, runs the age-out sweep, then
//! releases the lock across its idle sleep so viewers are never starved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use skywatch::Frame;
use tracing::{info, trace};

use crate::driver::Driver;
use crate::view::PlaneSnapshot;
use crate::Planes;

/// Pause between queue drains.
const IDLE: Duration = Duration::from_millis(100);

/// Pause between age-out sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Handle on the decode thread and the shared database.
pub struct Manager {
    db: Arc<Mutex<Planes>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Driver>>,
}

impl Manager {
    /// Spawn the decode thread over a started driver. `resume` re-installs
    /// a database captured by [`stop`](Self::stop) across a teardown.
    pub fn start(driver: Driver, resume: Option<Planes>) -> Self {
        let db = Arc::new(Mutex::new(resume.unwrap_or_default()));
        let running = Arc::new(AtomicBool::new(true));

        let thread_db = Arc::clone(&db);
        let flag = Arc::clone(&running);
        let handle = std::thread::spawn(move || decode_loop(driver, &thread_db, &flag));

        Self {
            db,
            running,
            handle: Some(handle),
        }
    }

    /// Total CRC-valid messages decoded.
    #[must_use]
    pub fn msg_count(&self) -> u64 {
        self.db.lock().unwrap().message_count()
    }

    /// Currently tracked planes.
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.db.lock().unwrap().len()
    }

    /// Consistent copy of every tracked plane.
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> Vec<PlaneSnapshot> {
        self.db.lock().unwrap().snapshot(now)
    }

    /// Stop decode and I/O threads, returning the database so a later
    /// [`start`](Self::start) can resume from it.
    pub fn stop(&mut self) -> Option<Planes> {
        self.running.store(false, Ordering::Relaxed);
        let handle = self.handle.take()?;
        // the returned driver has already been stopped by the loop
        drop(handle.join().ok()?);
        info!("manager stopped");
        Some(self.db.lock().unwrap().clone())
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn decode_loop(mut driver: Driver, db: &Mutex<Planes>, running: &AtomicBool) -> Driver {
    let mut last_sweep = Instant::now();
    while running.load(Ordering::Relaxed) {
        {
            let mut planes = db.lock().unwrap();
            while let Some(message) = driver.read_next_message() {
                match Frame::from_bytes(&message) {
                    Ok(frame) => planes.action(&frame, Instant::now()),
                    // parity mismatches and foreign downlink formats are
                    // dropped without noise
                    Err(e) => trace!("dropped frame: {e}"),
                }
            }
            let now = Instant::now();
            if now.duration_since(last_sweep) >= SWEEP_INTERVAL {
                planes.prune(now);
                last_sweep = now;
            }
        }
        std::thread::sleep(IDLE);
    }
    driver.stop();
    driver
}
