//! Touchscreen input.
//!
//! [`Touchscreen`] owns the evdev device; [`TouchDecoder`] turns its raw
//! event stream into down/motion/up in surface pixels and is device-free.

use anyhow::{bail, Context, Result};
use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind, Key, Synchronization};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::os::fd::{AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};

/// A decoded touch gesture step, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    Down { x: i32, y: i32 },
    Motion { x: i32, y: i32 },
    Up,
}

/// The subset of evdev events the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTouch {
    Touch(bool),
    X(i32),
    Y(i32),
    /// Multitouch slot switch; positions only count in slot 0.
    Slot(i32),
    Sync,
}

/// Range of one absolute axis as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    /// Map a raw axis value onto `[0, extent)`.
    pub fn map(&self, value: i32, extent: i32) -> i32 {
        let span = (self.max as i64 - self.min as i64 + 1).max(1);
        let v = (value as i64 - self.min as i64) * extent as i64 / span;
        v.clamp(0, (extent as i64 - 1).max(0)) as i32
    }
}

/// Accumulates raw events and emits gestures on each sync report.
#[derive(Debug, Clone)]
pub struct TouchDecoder {
    x_axis: AxisRange,
    y_axis: AxisRange,
    width: i32,
    height: i32,
    raw_x: i32,
    raw_y: i32,
    moved: bool,
    touching: bool,
    pending_touch: Option<bool>,
    slot: i32,
}

impl TouchDecoder {
    pub fn new(x_axis: AxisRange, y_axis: AxisRange, width: i32, height: i32) -> Self {
        Self {
            x_axis,
            y_axis,
            width,
            height,
            raw_x: x_axis.min,
            raw_y: y_axis.min,
            moved: false,
            touching: false,
            pending_touch: None,
            slot: 0,
        }
    }

    fn position(&self) -> (i32, i32) {
        (
            self.x_axis.map(self.raw_x, self.width),
            self.y_axis.map(self.raw_y, self.height),
        )
    }

    /// Feed one event. Returns a gesture step when a report completes one.
    pub fn feed(&mut self, event: RawTouch) -> Option<TouchEvent> {
        match event {
            RawTouch::Touch(down) => self.pending_touch = Some(down),
            RawTouch::Slot(slot) => self.slot = slot,
            RawTouch::X(_) | RawTouch::Y(_) if self.slot != 0 => {}
            RawTouch::X(v) => {
                self.raw_x = v;
                self.moved = true;
            }
            RawTouch::Y(v) => {
                self.raw_y = v;
                self.moved = true;
            }
            RawTouch::Sync => return self.sync(),
        }
        None
    }

    fn sync(&mut self) -> Option<TouchEvent> {
        let moved = std::mem::take(&mut self.moved);
        let (x, y) = self.position();
        match self.pending_touch.take() {
            Some(true) if !self.touching => {
                self.touching = true;
                Some(TouchEvent::Down { x, y })
            }
            Some(false) if self.touching => {
                self.touching = false;
                Some(TouchEvent::Up)
            }
            _ if self.touching && moved => Some(TouchEvent::Motion { x, y }),
            _ => None,
        }
    }
}

/// Axis codes for X and Y, preferring multitouch slots.
fn position_axes(device: &Device) -> Option<(AbsoluteAxisType, AbsoluteAxisType)> {
    let axes = device.supported_absolute_axes()?;
    if axes.contains(AbsoluteAxisType::ABS_MT_POSITION_X)
        && axes.contains(AbsoluteAxisType::ABS_MT_POSITION_Y)
    {
        Some((
            AbsoluteAxisType::ABS_MT_POSITION_X,
            AbsoluteAxisType::ABS_MT_POSITION_Y,
        ))
    } else if axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y) {
        Some((AbsoluteAxisType::ABS_X, AbsoluteAxisType::ABS_Y))
    } else {
        None
    }
}

fn is_touchscreen(device: &Device) -> bool {
    position_axes(device).is_some()
        && device
            .supported_keys()
            .is_some_and(|keys| keys.contains(Key::BTN_TOUCH))
}

/// A pollable source of decoded touch events.
pub trait TouchSource {
    fn poll_fd(&self) -> BorrowedFd<'_>;
    /// Read and decode everything pending.
    fn drain(&mut self) -> Result<Vec<TouchEvent>>;
}

/// An open touchscreen with non-blocking reads.
pub struct Touchscreen {
    device: Device,
    x_code: AbsoluteAxisType,
    y_code: AbsoluteAxisType,
    decoder: TouchDecoder,
}

impl Touchscreen {
    /// Open `path`, or the first touch-capable `event*` node under `input_dir`.
    pub fn open(path: Option<&Path>, input_dir: &Path, width: i32, height: i32) -> Result<Self> {
        let (path, device) = match path {
            Some(path) => {
                let device = Device::open(path)
                    .with_context(|| format!("Failed to open input device {}", path.display()))?;
                if !is_touchscreen(&device) {
                    bail!("{} is not a touchscreen", path.display());
                }
                (path.to_path_buf(), device)
            }
            None => find_touchscreen(input_dir)?,
        };

        let Some((x_code, y_code)) = position_axes(&device) else {
            bail!("{} reports no position axes", path.display());
        };
        let abs = device
            .get_abs_state()
            .with_context(|| format!("Failed to read axis ranges of {}", path.display()))?;
        let range = |axis: AbsoluteAxisType| {
            abs.get(axis.0 as usize)
                .map(|info| AxisRange {
                    min: info.minimum,
                    max: info.maximum,
                })
                .unwrap_or(AxisRange { min: 0, max: 0 })
        };
        let (x_axis, y_axis) = (range(x_code), range(y_code));
        let mut decoder = TouchDecoder::new(x_axis, y_axis, width, height);
        if x_code == AbsoluteAxisType::ABS_MT_POSITION_X {
            // Start from whichever slot the driver last reported.
            if let Some(info) = abs.get(AbsoluteAxisType::ABS_MT_SLOT.0 as usize) {
                decoder.feed(RawTouch::Slot(info.value));
            }
        }

        set_nonblocking(&device)?;
        tracing::info!(
            "Touchscreen {:?} ({}): x {:?}, y {:?}",
            path,
            device.name().unwrap_or("unnamed"),
            x_axis,
            y_axis
        );

        Ok(Self {
            device,
            x_code,
            y_code,
            decoder,
        })
    }
}

impl TouchSource for Touchscreen {
    fn drain(&mut self) -> Result<Vec<TouchEvent>> {
        let mut out = Vec::new();
        loop {
            let (x_code, y_code) = (self.x_code, self.y_code);
            let raw: Vec<RawTouch> = match self.device.fetch_events() {
                Ok(events) => events
                    .filter_map(|ev| classify(&ev, x_code, y_code))
                    .collect(),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("Failed to read touch events"),
            };
            out.extend(raw.into_iter().filter_map(|ev| self.decoder.feed(ev)));
        }
        Ok(out)
    }

    fn poll_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: the device owns this fd and outlives the borrow.
        unsafe { BorrowedFd::borrow_raw(self.device.as_raw_fd()) }
    }
}

fn classify(event: &InputEvent, x_code: AbsoluteAxisType, y_code: AbsoluteAxisType) -> Option<RawTouch> {
    match event.kind() {
        InputEventKind::Synchronization(Synchronization::SYN_REPORT) => Some(RawTouch::Sync),
        InputEventKind::Key(Key::BTN_TOUCH) => Some(RawTouch::Touch(event.value() != 0)),
        InputEventKind::AbsAxis(axis) if axis == x_code => Some(RawTouch::X(event.value())),
        InputEventKind::AbsAxis(axis) if axis == y_code => Some(RawTouch::Y(event.value())),
        InputEventKind::AbsAxis(AbsoluteAxisType::ABS_MT_SLOT)
            if x_code == AbsoluteAxisType::ABS_MT_POSITION_X =>
        {
            Some(RawTouch::Slot(event.value()))
        }
        _ => None,
    }
}

fn set_nonblocking(device: &Device) -> Result<()> {
    let fd = device.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFL).context("Failed to read input device flags")?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).context("Failed to make input device non-blocking")?;
    Ok(())
}

/// `event*` nodes under `dir`, in numeric order.
pub fn event_nodes(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("event")?.parse().ok()?;
            Some((index, entry.path()))
        })
        .collect();
    nodes.sort();
    Ok(nodes.into_iter().map(|(_, path)| path).collect())
}

fn find_touchscreen(dir: &Path) -> Result<(PathBuf, Device)> {
    for path in event_nodes(dir)? {
        match Device::open(&path) {
            Ok(device) if is_touchscreen(&device) => return Ok((path, device)),
            Ok(_) => tracing::debug!("{:?} is not a touchscreen", path),
            Err(e) => tracing::debug!("Skipping {:?}: {}", path, e),
        }
    }
    bail!("No touchscreen found under {}", dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    fn decoder() -> TouchDecoder {
        // 0..=4095 on both axes onto an 800x480 screen.
        let axis = AxisRange { min: 0, max: 4095 };
        TouchDecoder::new(axis, axis, 800, 480)
    }

    fn feed_all(d: &mut TouchDecoder, events: &[RawTouch]) -> Vec<TouchEvent> {
        events.iter().filter_map(|&ev| d.feed(ev)).collect()
    }

    #[test_case(0, 0 ; "minimum")]
    #[test_case(2048, 400 ; "midpoint")]
    #[test_case(4095, 799 ; "maximum")]
    fn test_axis_map(value: i32, expected: i32) {
        assert_eq!(AxisRange { min: 0, max: 4095 }.map(value, 800), expected);
    }

    #[test]
    fn test_axis_map_with_offset_range() {
        let axis = AxisRange { min: 100, max: 199 };
        assert_eq!(axis.map(100, 50), 0);
        assert_eq!(axis.map(150, 50), 25);
        assert_eq!(axis.map(50, 50), 0);
        assert_eq!(axis.map(500, 50), 49);
    }

    #[test]
    fn test_degenerate_axis_does_not_divide_by_zero() {
        let axis = AxisRange { min: 5, max: 4 };
        assert_eq!(axis.map(5, 100), 0);
    }

    #[test]
    fn test_tap_produces_down_then_up() {
        let mut d = decoder();
        let events = feed_all(
            &mut d,
            &[
                RawTouch::Touch(true),
                RawTouch::X(2048),
                RawTouch::Y(1024),
                RawTouch::Sync,
                RawTouch::Touch(false),
                RawTouch::Sync,
            ],
        );
        assert_eq!(events, vec![TouchEvent::Down { x: 400, y: 120 }, TouchEvent::Up]);
    }

    #[test]
    fn test_motion_only_while_touching() {
        let mut d = decoder();
        let events = feed_all(
            &mut d,
            &[
                RawTouch::X(100),
                RawTouch::Sync,
                RawTouch::Touch(true),
                RawTouch::Sync,
                RawTouch::Y(4095),
                RawTouch::Sync,
                RawTouch::Sync,
            ],
        );
        assert_eq!(
            events,
            vec![
                TouchEvent::Down { x: 19, y: 0 },
                TouchEvent::Motion { x: 19, y: 479 },
            ]
        );
    }

    #[test]
    fn test_repeated_touch_state_is_not_an_edge() {
        let mut d = decoder();
        let events = feed_all(
            &mut d,
            &[
                RawTouch::Touch(true),
                RawTouch::Sync,
                RawTouch::Touch(true),
                RawTouch::Sync,
                RawTouch::Touch(false),
                RawTouch::Sync,
                RawTouch::Touch(false),
                RawTouch::Sync,
            ],
        );
        assert_eq!(events, vec![TouchEvent::Down { x: 0, y: 0 }, TouchEvent::Up]);
    }

    #[test]
    fn test_second_finger_does_not_move_the_first() {
        let mut d = decoder();
        let events = feed_all(
            &mut d,
            &[
                RawTouch::Touch(true),
                RawTouch::X(2048),
                RawTouch::Y(1024),
                RawTouch::Sync,
                RawTouch::Slot(1),
                RawTouch::X(4000),
                RawTouch::Y(4000),
                RawTouch::Sync,
                RawTouch::Slot(0),
                RawTouch::Y(2048),
                RawTouch::Sync,
            ],
        );
        assert_eq!(
            events,
            vec![
                TouchEvent::Down { x: 400, y: 120 },
                TouchEvent::Motion { x: 400, y: 240 },
            ]
        );
    }

    #[test]
    fn test_event_nodes_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["event10", "event2", "mouse0", "event0", "eventX"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let names: Vec<String> = event_nodes(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["event0", "event2", "event10"]);
    }

    #[test]
    fn test_no_touchscreen_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let Err(err) = Touchscreen::open(None, dir.path(), 800, 480) else {
            panic!("an empty directory has no touchscreen");
        };
        assert!(err.to_string().contains("No touchscreen"));
    }

    proptest! {
        /// Property: mapped coordinates always land on the surface
        #[test]
        fn prop_axis_map_in_bounds(min in -5000i32..5000, span in 0i32..10000, value in any::<i32>(), extent in 1i32..4000) {
            let axis = AxisRange { min, max: min + span };
            let v = axis.map(value, extent);
            prop_assert!(v >= 0 && v < extent);
        }
    }
}
