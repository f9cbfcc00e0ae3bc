use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Set when the process receives SIGINT or SIGTERM.
/// Polling loops check it between scheduler queries.
#[derive(Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flag that is raised by SIGINT and SIGTERM.
    ///
    /// The default action of these signals is replaced, so the process keeps running until
    /// the flag is observed and the cluster is cleaned up.
    pub fn register_signals() -> crate::Result<Self> {
        let interrupt = Self::new();
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, interrupt.flag.clone())?;
        }
        Ok(interrupt)
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
