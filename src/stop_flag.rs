//! Process-wide cooperative shutdown flag.

use portable_atomic::{AtomicBool, Ordering};

/// One-way flag every actor checks once per loop.
///
/// Raising it is idempotent; nothing lowers it again.
#[derive(Debug, Default)]
pub struct StopFlag(AtomicBool);

impl StopFlag {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
