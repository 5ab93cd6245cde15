//! Loading spinner driven by the message loop instead of a render thread:
//! each animation frame is a timed task whose completion message re-arms the
//! next one while the owning view is still loading.

use std::thread;
use std::time::Duration;

use crate::event::Cmd;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Posted back to the view when the next frame is due.
pub struct SpinnerTick;

#[derive(Default)]
pub struct Spinner {
    frame: usize,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()]
    }

    pub fn advance(&mut self) {
        self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
    }

    /// Schedules the next [`SpinnerTick`]. The view re-arms this from its
    /// tick handler for as long as the spinner should keep moving.
    pub fn tick() -> Cmd {
        Cmd::task(|| {
            thread::sleep(FRAME_INTERVAL);
            Some(SpinnerTick)
        })
    }
}
