//! Simulation-to-render hand-off and the render thread
//!
//! The simulation publishes a finished [`RenderBuffer`] into a single
//! mutex-guarded slot, replacing whatever was there. The render thread runs on
//! its own clock, clones the latest handle under the lock and composites it
//! outside the lock, so it never sees a buffer that is still being built.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::canvas::Canvas;
use super::command::RenderBuffer;
use crate::clock::FrameClock;
use crate::error::{GameError, Result};

/// Latest published frame
#[derive(Debug, Default)]
pub struct FrameSlot {
    slot: Mutex<Option<Arc<RenderBuffer>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published buffer
    pub fn publish(&self, buffer: RenderBuffer) {
        *self.slot.lock() = Some(Arc::new(buffer));
    }

    /// Shared handle to the most recent buffer, if any was published
    pub fn latest(&self) -> Option<Arc<RenderBuffer>> {
        self.slot.lock().clone()
    }
}

/// Presentation backend (window, video encoder, test probe)
pub trait Display: Send {
    fn present(&mut self, canvas: &Canvas) -> Result<()>;
}

/// Display that only counts presented frames
#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    frames: Arc<AtomicU64>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counter, readable after the display moved to the render thread
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }
}

impl Display for HeadlessDisplay {
    fn present(&mut self, _canvas: &Canvas) -> Result<()> {
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Render-side counters, read by the simulation's diagnostics
#[derive(Debug, Default)]
pub struct RenderStats {
    frames: AtomicU64,
    /// Frames per second x1000
    fps_milli: AtomicU32,
}

impl RenderStats {
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn fps(&self) -> f32 {
        self.fps_milli.load(Ordering::Relaxed) as f32 / 1000.0
    }

    fn record(&self, fps: f32) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.fps_milli
            .store((fps * 1000.0) as u32, Ordering::Relaxed);
    }
}

/// Owner of the render thread; stops and joins it on shutdown or drop
pub struct RenderHandle {
    stop: Arc<AtomicBool>,
    stats: Arc<RenderStats>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl RenderHandle {
    /// Start the render loop at `rate` frames per second
    pub fn spawn(
        slot: Arc<FrameSlot>,
        mut display: Box<dyn Display>,
        width: u32,
        height: u32,
        rate: u32,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(RenderStats::default());
        let thread = {
            let stop = Arc::clone(&stop);
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name("render".into())
                .spawn(move || {
                    let mut clock = FrameClock::new();
                    let mut canvas = Canvas::new(width, height);
                    log::info!("Render thread started ({}x{} @ {} Hz)", width, height, rate);
                    while !stop.load(Ordering::Acquire) {
                        clock.tick(rate);
                        match slot.latest() {
                            Some(buffer) => canvas.composite(&buffer),
                            None => canvas.clear(crate::assets::Rgba::BLACK),
                        }
                        display.present(&canvas)?;
                        stats.record(clock.fps());
                    }
                    log::info!("Render thread stopped after {} frames", stats.frames());
                    Ok(())
                })
                .map_err(|e| GameError::RenderThread(e.to_string()))?
        };
        Ok(Self {
            stop,
            stats,
            thread: Some(thread),
        })
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the thread and wait for it; reports display errors and panics
    pub fn shutdown(mut self) -> Result<()> {
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Release);
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| GameError::RenderThread("render thread panicked".into()))?,
            None => Ok(()),
        }
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            log::error!("Render thread: {}", e);
        }
    }
}
