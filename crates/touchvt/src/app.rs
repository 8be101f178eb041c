//! Startup and teardown.

use anyhow::{Context, Result};
use glyphs::GlyphAdapter;
use settings::constants::{colors, paths};
use settings::Config;
use std::path::Path;
use terminal::{Engine, Palette, PtyHandler};
use terminal_view::Viewport;

use crate::cli::Cli;
use crate::input::Touchscreen;
use crate::session::Session;
use crate::{console, event_loop, signals};

/// Load the config named on the command line, or the default one.
pub fn resolve_config(cli: &Cli) -> Config {
    match cli.config.as_deref() {
        Some(path) => settings::load_config_from(path),
        None => settings::load_config(),
    }
}

/// The child's argv: the trailing command, or the configured shell.
pub fn child_command(cli: &Cli, config: &Config) -> Vec<String> {
    if cli.command.is_empty() {
        vec![config.shell()]
    } else {
        cli.command.clone()
    }
}

/// Bring everything up, run until told to stop, then tear down.
pub fn run(cli: Cli) -> Result<()> {
    let signals = signals::install()?;
    let config = resolve_config(&cli);

    let mut surface = framebuffer::device::open(&config.framebuffer)
        .with_context(|| format!("Cannot use framebuffer {}", config.framebuffer.display()))?;
    surface.clear(colors::BACKGROUND);

    if let Some(vt) = cli.vt {
        if let Err(e) = console::activate(Path::new(paths::CONSOLE), vt) {
            tracing::warn!("Could not switch to console {}: {:#}", vt, e);
        }
    }

    let font_path = cli.font.as_deref().or(config.font_path.as_deref());
    let font = glyphs::load_font(font_path).context("Failed to load font")?;
    let mut glyphs = GlyphAdapter::new(font, config.font_size());
    let viewport = Viewport::compute(
        surface.width(),
        surface.height(),
        config.font_size(),
        &mut glyphs,
    );
    tracing::info!(
        "Terminal grid {}x{} at {} px",
        viewport.cols,
        viewport.rows,
        viewport.font_size
    );

    let engine = Engine::new(
        viewport.geometry(),
        config.scrollback_lines(),
        Palette::default(),
    );
    let argv = child_command(&cli, &config);
    let pty = PtyHandler::spawn(&argv, &config.term, viewport.geometry())
        .context("Failed to start child process")?;

    let mut touch = Touchscreen::open(
        config.touch_device.as_deref(),
        Path::new(paths::INPUT_DIR),
        surface.width(),
        surface.height(),
    )
    .context("Failed to open touchscreen")?;

    let mut session = Session::new(surface, glyphs, viewport, engine, pty);
    session.redraw_all();

    let reason = event_loop::run(&mut session, &mut touch, &signals)?;
    tracing::info!("Shutting down: {:?}", reason);

    let surface = session.into_surface();
    drop(touch);
    tracing::debug!("Touchscreen released");
    drop(surface);
    tracing::debug!("Framebuffer unmapped");
    Ok(())
}
