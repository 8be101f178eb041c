//! Virtual console switching.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::path::Path;

const VT_ACTIVATE: u32 = 0x5606;
const VT_WAITACTIVE: u32 = 0x5607;

nix::ioctl_write_int_bad!(vt_activate, VT_ACTIVATE);
nix::ioctl_write_int_bad!(vt_waitactive, VT_WAITACTIVE);

/// Bring virtual console `vt` to the foreground and wait until it is active.
pub fn activate(console: &Path, vt: u32) -> Result<()> {
    let tty = OpenOptions::new()
        .read(true)
        .write(true)
        .open(console)
        .with_context(|| format!("Failed to open {}", console.display()))?;
    let fd = tty.as_raw_fd();
    let vt = vt as nix::libc::c_int;
    // SAFETY: both requests take the console number by value.
    unsafe {
        vt_activate(fd, vt).with_context(|| format!("VT_ACTIVATE {vt} failed"))?;
        vt_waitactive(fd, vt).with_context(|| format!("VT_WAITACTIVE {vt} failed"))?;
    }
    tracing::info!("Switched to virtual console {}", vt);
    Ok(())
}
