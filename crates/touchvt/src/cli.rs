//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "touchvt", version)]
#[command(about = "Framebuffer terminal with an on-screen touch keyboard")]
pub struct Cli {
    /// Font file (TrueType/OpenType). Falls back to the built-in font if unusable.
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,

    /// Switch to this virtual console before drawing (e.g. `3` or `tty3`)
    #[arg(long, value_name = "N", value_parser = parse_vt)]
    pub vt: Option<u32>,

    /// Config file to read instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the default config file and exit
    #[arg(long)]
    pub print_config: bool,

    /// Command to run instead of the shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Accept `N` or `ttyN`.
fn parse_vt(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("tty").unwrap_or(s);
    match digits.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid virtual console {s:?}, expected N or ttyN")),
    }
}
