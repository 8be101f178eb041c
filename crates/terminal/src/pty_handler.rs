//! PTY process management.

use anyhow::{Context, Result};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty};
use std::io::{Read, Write};
use std::os::fd::{BorrowedFd, RawFd};

use crate::types::WindowGeometry;

/// The write side of the child process, as seen by the session.
///
/// Terminal write-back and keyboard bytes go through `write_all`; every
/// layout change is pushed through `resize`.
pub trait ChildChannel {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;
    fn resize(&mut self, geometry: WindowGeometry) -> Result<()>;
}

/// A child process running under a pseudo-terminal.
///
/// Reads are non-blocking so the event loop can drain all pending output
/// after a single readiness notification. Dropping the handler hangs up the
/// child and reaps it.
pub struct PtyHandler {
    master: Box<dyn MasterPty + Send>,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
}

impl PtyHandler {
    /// Spawn `argv` under a new PTY sized to `geometry`, with `TERM` set to `term`.
    pub fn spawn(argv: &[String], term: &str, geometry: WindowGeometry) -> Result<Self> {
        let (program, args) = argv.split_first().context("Empty command line")?;

        let pair = native_pty_system()
            .openpty(geometry.pty_size())
            .context("Failed to open PTY")?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);
        cmd.env("TERM", term);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("Failed to spawn {}", program))?;

        // The slave end belongs to the child now.
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .context("Failed to get PTY writer")?;
        let reader = pair
            .master
            .try_clone_reader()
            .context("Failed to get PTY reader")?;

        tracing::info!(
            "Spawned {} (pid {:?}) on {}x{} PTY",
            program,
            child.process_id(),
            geometry.size.cols,
            geometry.size.rows
        );

        let handler = Self {
            master: pair.master,
            reader,
            writer,
            child,
        };
        handler.set_nonblocking()?;
        Ok(handler)
    }

    /// File descriptor to poll for child output.
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.master.as_raw_fd()
    }

    /// The master fd, borrowed for polling.
    pub fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        // SAFETY: the master PTY owns this fd and outlives the borrow.
        self.raw_fd().map(|fd| unsafe { BorrowedFd::borrow_raw(fd) })
    }

    fn set_nonblocking(&self) -> Result<()> {
        let fd = self.raw_fd().context("PTY master has no file descriptor")?;
        let flags = fcntl(fd, FcntlArg::F_GETFL).context("Failed to read PTY flags")?;
        let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
        fcntl(fd, FcntlArg::F_SETFL(flags)).context("Failed to make PTY non-blocking")?;
        Ok(())
    }

    /// Read pending output. `WouldBlock` means the child has nothing more for now.
    pub fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }

    /// Check if the child process has exited. Reaps it if so.
    pub fn has_exited(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::info!("Child exited: {:?}", status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::debug!("Wait for child process: {}", e);
                true
            }
        }
    }
}

impl ChildChannel for PtyHandler {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    fn resize(&mut self, geometry: WindowGeometry) -> Result<()> {
        self.master
            .resize(geometry.pty_size())
            .context("Failed to resize PTY")?;
        Ok(())
    }
}

impl Drop for PtyHandler {
    fn drop(&mut self) {
        // Sends SIGHUP first; escalates only if the child ignores it
        if let Err(e) = self.child.kill() {
            // ESRCH (no such process) is expected if already exited
            tracing::debug!("Kill child process: {}", e);
        }

        // Wait for child to reap it (avoid zombie)
        if let Err(e) = self.child.wait() {
            tracing::debug!("Wait for child process: {}", e);
        }

        tracing::debug!("PTY handler dropped, child process cleaned up");
    }
}
