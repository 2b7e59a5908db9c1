//! Interrupt handling for interactive loops via a global atomic flag

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the SIGINT/SIGTERM handler.
pub fn interrupt_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

pub fn is_interrupted() -> bool {
    interrupt_flag().load(Ordering::Relaxed)
}

pub fn request_interrupt() {
    interrupt_flag().store(true, Ordering::Relaxed);
}

/// Register SIGINT and SIGTERM handlers.
///
/// The first signal only raises the flag so the running loop can stop and
/// keep the work done so far; a second one exits with status 130.
pub fn install_signal_handlers() -> io::Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // SAFETY: the handler only touches an AtomicBool and calls exit,
        // both async-signal-safe
        unsafe {
            signal_hook::low_level::register(signal, || {
                if interrupt_flag().swap(true, Ordering::Relaxed) {
                    std::process::exit(130);
                }
            })?;
        }
    }
    Ok(())
}
