use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Start button shared by the main widget and the hero launcher. While a run
/// holds the guard the button is disabled and further launches are no-ops.
#[derive(Clone, Debug, Default)]
pub struct SpeedTestTrigger {
    disabled: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct RunGuard {
    disabled: Arc<AtomicBool>,
}

impl SpeedTestTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn try_start(&self) -> Option<RunGuard> {
        if self.disabled.swap(true, Ordering::AcqRel) {
            return None;
        }

        Some(RunGuard {
            disabled: Arc::clone(&self.disabled),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.disabled.store(false, Ordering::Release);
    }
}
