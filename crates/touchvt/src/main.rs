use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use touchvt::Cli;

/// Check if debug mode is enabled via TOUCHVT_DEBUG env var.
fn is_debug_mode() -> bool {
    std::env::var("TOUCHVT_DEBUG").is_ok()
}

/// Initialize the logging system.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // In debug mode, enable trace logging for touchvt
    let default_filter = if is_debug_mode() {
        "touchvt=trace,terminal=debug,terminal_view=debug,keyboard=debug,info"
    } else {
        "touchvt=info,framebuffer=info,glyphs=info,terminal=info,warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    if is_debug_mode() {
        info!(
            "touchvt v{} starting up (DEBUG MODE ENABLED)",
            env!("CARGO_PKG_VERSION")
        );
        info!("Set RUST_LOG for custom log levels, e.g. RUST_LOG=touchvt=trace");
    } else {
        info!("touchvt v{} starting up", env!("CARGO_PKG_VERSION"));
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.print_config {
        print!("{}", settings::DEFAULT_CONFIG);
        return ExitCode::SUCCESS;
    }

    init_logging();

    match touchvt::app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
