//! The single-threaded poll loop.

use anyhow::Result;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::ErrorKind;
use std::ops::DerefMut;
use terminal::PtyHandler;

use crate::input::TouchSource;
use crate::session::Session;
use crate::signals::Signals;

const READ_CHUNK: usize = 4096;

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    ChildExited,
    PollFailed,
    InputLost,
}

/// What a drain of the child's output found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PtyDrain {
    bytes: usize,
    closed: bool,
}

impl PtyDrain {
    fn got_output(&self) -> bool {
        self.bytes > 0
    }
}

/// Read the pty until it would block, feeding everything to the session.
fn drain_pty<B>(session: &mut Session<B, PtyHandler>, buf: &mut [u8]) -> PtyDrain
where
    B: DerefMut<Target = [u8]>,
{
    let mut drain = PtyDrain::default();
    loop {
        match session.channel_mut().read(buf) {
            Ok(0) => {
                drain.closed = true;
                break;
            }
            Ok(n) => {
                session.on_output(&buf[..n]);
                drain.bytes += n;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                // EIO once the child has closed its side.
                tracing::debug!("PTY read ended: {}", e);
                drain.closed = true;
                break;
            }
        }
    }
    drain
}

fn readable(fd: &PollFd<'_>) -> bool {
    fd.revents()
        .is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR))
}

/// Multiplex child output, touch input and signals until a stop condition.
pub fn run<B, T>(
    session: &mut Session<B, PtyHandler>,
    touch: &mut T,
    signals: &Signals,
) -> Result<StopReason>
where
    B: DerefMut<Target = [u8]>,
    T: TouchSource,
{
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        // Drain first: a signal landing after this point leaves a byte in
        // the pipe and the poll below returns at once.
        signals.drain();
        if signals.stop_requested() {
            tracing::info!("Termination requested");
            return Ok(StopReason::Signal);
        }
        if signals.take_child_event() && session.channel_mut().has_exited() {
            return Ok(StopReason::ChildExited);
        }

        let (pty_ready, touch_ready) = {
            let Some(pty_fd) = session.channel_mut().poll_fd() else {
                anyhow::bail!("PTY master has no file descriptor");
            };
            let mut fds = [
                PollFd::new(pty_fd, PollFlags::POLLIN),
                PollFd::new(touch.poll_fd(), PollFlags::POLLIN),
                PollFd::new(signals.poll_fd(), PollFlags::POLLIN),
            ];
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    tracing::error!("poll failed: {}", e);
                    return Ok(StopReason::PollFailed);
                }
            }
            (readable(&fds[0]), readable(&fds[1]))
        };

        let mut dirty = false;
        if pty_ready {
            let drain = drain_pty(session, &mut buf);
            dirty |= drain.got_output();
            if drain.closed {
                tracing::info!("Child closed the terminal");
                return Ok(StopReason::ChildExited);
            }
        }
        if touch_ready {
            match touch.drain() {
                Ok(events) => {
                    for event in events {
                        dirty |= session.on_touch(event);
                    }
                }
                Err(e) => {
                    tracing::error!("{:#}", e);
                    return Ok(StopReason::InputLost);
                }
            }
        }
        if dirty {
            session.render_terminal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TouchEvent;
    use crate::signals;
    use framebuffer::Surface;
    use glyphs::GlyphAdapter;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::io::Write;
    use std::os::fd::{AsFd, BorrowedFd};
    use std::os::unix::net::UnixStream;
    use std::time::{Duration, Instant};
    use terminal::{Engine, Palette};
    use terminal_view::Viewport;

    const WIDTH: i32 = 240;
    const HEIGHT: i32 = 400;

    fn session(script: &str) -> Session<Vec<u8>, PtyHandler> {
        let surface = Surface::new(
            vec![0u8; (WIDTH * HEIGHT * 4) as usize],
            WIDTH as u32,
            HEIGHT as u32,
            WIDTH as u32,
        )
        .unwrap();
        let mut glyphs = GlyphAdapter::new(glyphs::load_font(None).unwrap(), 16);
        let viewport = Viewport::compute(WIDTH, HEIGHT, 16, &mut glyphs);
        let engine = Engine::new(viewport.geometry(), 100, Palette::default());
        let argv = vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()];
        let pty = PtyHandler::spawn(&argv, "xterm-256color", viewport.geometry()).unwrap();
        Session::new(surface, glyphs, viewport, engine, pty)
    }

    fn wait_for_exit(session: &mut Session<Vec<u8>, PtyHandler>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !session.channel_mut().has_exited() {
            assert!(Instant::now() < deadline, "child did not exit");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// A touch source on a socket pair; writing to `feed` makes it readable.
    struct FakeTouch {
        rx: UnixStream,
        feed: UnixStream,
        fail: bool,
        drained: usize,
    }

    impl FakeTouch {
        fn new(fail: bool) -> Self {
            let (rx, feed) = UnixStream::pair().unwrap();
            Self {
                rx,
                feed,
                fail,
                drained: 0,
            }
        }
    }

    impl TouchSource for FakeTouch {
        fn poll_fd(&self) -> BorrowedFd<'_> {
            self.rx.as_fd()
        }

        fn drain(&mut self) -> Result<Vec<TouchEvent>> {
            self.drained += 1;
            if self.fail {
                anyhow::bail!("touch device unplugged");
            }
            Ok(Vec::new())
        }
    }

    #[test]
    #[serial]
    fn test_drain_reads_output_then_sees_close() {
        let mut s = session("printf hello");
        wait_for_exit(&mut s);
        let mut buf = vec![0u8; READ_CHUNK];
        let drain = drain_pty(&mut s, &mut buf);
        assert!(drain.got_output());
        assert_eq!(drain.bytes, 5);
        assert!(drain.closed);
    }

    #[test]
    #[serial]
    fn test_burst_larger_than_chunk_drains_in_one_call() {
        let mut s = session("printf '%10000s' ''");
        wait_for_exit(&mut s);
        let mut buf = vec![0u8; READ_CHUNK];
        let drain = drain_pty(&mut s, &mut buf);
        assert_eq!(drain.bytes, 10_000);
        assert!(drain.closed);
    }

    #[test]
    #[serial]
    fn test_idle_child_drains_nothing() {
        let mut s = session("sleep 5");
        let mut buf = vec![0u8; READ_CHUNK];
        let drain = drain_pty(&mut s, &mut buf);
        assert_eq!(drain, PtyDrain::default());
    }

    #[test]
    #[serial]
    fn test_run_ends_when_child_exits() {
        let signals = signals::install().unwrap();
        let mut s = session("printf bye");
        let mut touch = FakeTouch::new(false);
        let reason = run(&mut s, &mut touch, &signals).unwrap();
        assert_eq!(reason, StopReason::ChildExited);
        assert_eq!(touch.drained, 0);
    }

    #[test]
    #[serial]
    fn test_run_wakes_on_sigterm_while_idle() {
        let signals = signals::install().unwrap();
        let mut s = session("sleep 5");
        let mut touch = FakeTouch::new(false);
        let sender = std::thread::spawn(|| {
            std::thread::sleep(Duration::from_millis(100));
            kill(Pid::this(), Signal::SIGTERM).unwrap();
        });
        let start = Instant::now();
        let reason = run(&mut s, &mut touch, &signals).unwrap();
        sender.join().unwrap();
        assert_eq!(reason, StopReason::Signal);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    #[serial]
    fn test_pending_stop_is_seen_before_polling() {
        let signals = signals::install().unwrap();
        signals.request_stop();
        let mut s = session("sleep 5");
        let mut touch = FakeTouch::new(false);
        assert_eq!(
            run(&mut s, &mut touch, &signals).unwrap(),
            StopReason::Signal
        );
    }

    #[test]
    #[serial]
    fn test_touch_read_error_ends_loop() {
        let signals = signals::install().unwrap();
        let mut s = session("sleep 5");
        let mut touch = FakeTouch::new(true);
        touch.feed.write_all(b"x").unwrap();
        let reason = run(&mut s, &mut touch, &signals).unwrap();
        assert_eq!(reason, StopReason::InputLost);
        assert_eq!(touch.drained, 1);
    }
}
