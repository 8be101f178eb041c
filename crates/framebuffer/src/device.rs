//! Linux framebuffer device mapping.

use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::raw::c_ulong;
use std::path::{Path, PathBuf};

use crate::Surface;

/// Errors raised while opening or mapping a framebuffer.
#[derive(Debug, thiserror::Error)]
pub enum FramebufferError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to query screen info: {0}")]
    Query(#[source] nix::Error),
    #[error("unsupported pixel depth {0} bpp (need 32)")]
    UnsupportedDepth(u32),
    #[error("failed to map framebuffer: {0}")]
    Map(#[source] std::io::Error),
    #[error("pixel buffer of {len} bytes cannot hold {width}x{height} at stride {stride}")]
    BufferTooSmall {
        len: usize,
        width: u32,
        height: u32,
        stride: u32,
    },
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreenInfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbFixScreenInfo {
    id: [u8; 16],
    smem_start: c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

const FBIOGET_VSCREENINFO: u32 = 0x4600;
const FBIOGET_FSCREENINFO: u32 = 0x4602;

nix::ioctl_read_bad!(fbioget_vscreeninfo, FBIOGET_VSCREENINFO, FbVarScreenInfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, FBIOGET_FSCREENINFO, FbFixScreenInfo);

/// Screen geometry reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub line_length: u32,
    pub bits_per_pixel: u32,
}

impl Geometry {
    /// Row stride in pixels.
    pub fn stride(&self) -> u32 {
        self.line_length / 4
    }

    /// Bytes covered by the visible rows.
    pub fn map_len(&self) -> usize {
        self.line_length as usize * self.height as usize
    }
}

fn query(file: &File) -> Result<Geometry, FramebufferError> {
    let fd = file.as_raw_fd();
    let mut var = FbVarScreenInfo::default();
    let mut fix = FbFixScreenInfo::default();
    // SAFETY: both structs match the kernel layout and outlive the calls.
    unsafe {
        fbioget_vscreeninfo(fd, &mut var).map_err(FramebufferError::Query)?;
        fbioget_fscreeninfo(fd, &mut fix).map_err(FramebufferError::Query)?;
    }
    Ok(Geometry {
        width: var.xres,
        height: var.yres,
        line_length: fix.line_length,
        bits_per_pixel: var.bits_per_pixel,
    })
}

/// Open the framebuffer at `path` and map its visible area as a [`Surface`].
///
/// The surface owns the mapping; dropping it unmaps the device.
pub fn open(path: &Path) -> Result<Surface<MmapMut>, FramebufferError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| FramebufferError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let geometry = query(&file)?;
    if geometry.bits_per_pixel != 32 {
        return Err(FramebufferError::UnsupportedDepth(geometry.bits_per_pixel));
    }

    // SAFETY: the mapping is shared with the display hardware only; no other
    // process is expected to truncate a device node.
    let mmap = unsafe {
        MmapOptions::new()
            .len(geometry.map_len())
            .map_mut(&file)
            .map_err(FramebufferError::Map)?
    };

    tracing::info!(
        "Framebuffer {:?}: {}x{} stride {} bytes",
        path,
        geometry.width,
        geometry.height,
        geometry.line_length
    );

    Surface::new(mmap, geometry.width, geometry.height, geometry.stride())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_geometry_stride_in_pixels() {
        let g = Geometry {
            width: 800,
            height: 480,
            line_length: 3328,
            bits_per_pixel: 32,
        };
        assert_eq!(g.stride(), 832);
        assert_eq!(g.map_len(), 3328 * 480);
    }

    #[test]
    fn test_screeninfo_layout_matches_kernel() {
        assert_eq!(std::mem::size_of::<FbVarScreenInfo>(), 160);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(std::mem::size_of::<FbFixScreenInfo>(), 80);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(std::mem::size_of::<FbFixScreenInfo>(), 68);
    }

    #[test]
    fn test_open_missing_device_reports_path() {
        let Err(err) = open(Path::new("/nonexistent/fb9")) else {
            panic!("opening a missing device should fail");
        };
        assert!(matches!(err, FramebufferError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/fb9"));
    }
}
