//! Process signal handling.
//!
//! Handlers set atomic flags and write a byte to a self-pipe. The event loop
//! polls the pipe's read end next to its other fds, so a signal that lands
//! just before `poll` still wakes it.

use anyhow::{Context, Result};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use signal_hook::consts::{SIGCHLD, SIGINT, SIGTERM};
use signal_hook::low_level::pipe;
use signal_hook::SigId;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Registered handlers and the flags they set. Dropping unregisters them.
pub struct Signals {
    stop: Arc<AtomicBool>,
    child: Arc<AtomicBool>,
    wake: UnixStream,
    ids: Vec<SigId>,
}

impl Signals {
    /// SIGTERM or SIGINT arrived.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Whether SIGCHLD arrived since the last call.
    pub fn take_child_event(&self) -> bool {
        self.child.swap(false, Ordering::SeqCst)
    }

    /// Ask the loop to stop, as if SIGTERM had arrived.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Read end of the wake-up pipe, readable once any handled signal lands.
    pub fn poll_fd(&self) -> BorrowedFd<'_> {
        self.wake.as_fd()
    }

    /// Empty the wake-up pipe. Call before looking at the flags.
    pub fn drain(&self) {
        let mut buf = [0u8; 64];
        loop {
            match (&self.wake).read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::warn!("Failed to drain signal pipe: {}", e);
                    break;
                }
            }
        }
    }
}

impl Drop for Signals {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

/// Install handlers: SIGTERM/SIGINT stop, SIGCHLD flags the child, SIGHUP is ignored.
pub fn install() -> Result<Signals> {
    let (wake, notify) = UnixStream::pair().context("Failed to create signal pipe")?;
    wake.set_nonblocking(true)
        .context("Failed to make signal pipe non-blocking")?;
    notify
        .set_nonblocking(true)
        .context("Failed to make signal pipe non-blocking")?;

    let stop = Arc::new(AtomicBool::new(false));
    let child = Arc::new(AtomicBool::new(false));
    let mut ids = Vec::new();

    // Flags first: the loop reads them after it wakes on the pipe.
    for signal in [SIGTERM, SIGINT] {
        ids.push(
            signal_hook::flag::register(signal, Arc::clone(&stop))
                .with_context(|| format!("Failed to install handler for signal {}", signal))?,
        );
    }
    ids.push(
        signal_hook::flag::register(SIGCHLD, Arc::clone(&child))
            .context("Failed to install SIGCHLD handler")?,
    );
    for signal in [SIGTERM, SIGINT, SIGCHLD] {
        let notify = notify
            .try_clone()
            .context("Failed to clone signal pipe")?;
        ids.push(
            pipe::register(signal, notify)
                .with_context(|| format!("Failed to route signal {} to the pipe", signal))?,
        );
    }

    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // SAFETY: SIG_IGN installs no handler code.
    unsafe { sigaction(Signal::SIGHUP, &ignore) }.context("Failed to ignore SIGHUP")?;

    tracing::debug!("Signal handlers installed");
    Ok(Signals {
        stop,
        child,
        wake,
        ids,
    })
}
