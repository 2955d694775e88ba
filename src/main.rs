mod cli;
mod commands;
mod config;
mod release;

use anyhow::Result;
use clap::Parser;

use cli::args::Cli;
use config::VerifyConfig;

fn main() -> Result<()> {
    setup_broken_pipe_handling();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = VerifyConfig::from_cli(&cli, release::get_auth_token_from_env())?;
    log::debug!(
        "verifying channel {} via {}://{} (warn: {})",
        config.channel,
        config.protocol,
        config.host,
        config.warn
    );

    commands::verify::run(&config)
}

/// Initialize logging based on the `--verbose` flag or `RELEASE_VERIFY_LOG` env var.
///
/// - `RELEASE_VERIFY_LOG` env var: full filter control (e.g. `RELEASE_VERIFY_LOG=release_verify=trace`)
/// - `--verbose`: sets `release_verify` crate to `Debug` level
/// - Otherwise: `Warn` level only (effectively silent)
fn init_logging(verbose: bool) {
    let env_var = std::env::var("RELEASE_VERIFY_LOG").ok();

    let mut builder = env_logger::Builder::new();
    builder.format_target(true);
    builder.format_module_path(false);

    if let Some(ref filter) = env_var {
        builder.parse_filters(filter);
    } else if verbose {
        builder.filter_module("release_verify", log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.init();
}

/// Handle broken pipe gracefully instead of panicking.
///
/// When output is piped to a process that exits early (e.g. `release-verify ... | head -3`),
/// `println!` panics because the runtime sets SIGPIPE to SIG_IGN. On Unix this resets
/// SIGPIPE to the default so the OS terminates the process cleanly; everywhere else a
/// panic hook exits silently on stdout pipe failures.
fn setup_broken_pipe_handling() {
    #[cfg(unix)]
    unsafe {
        // SIGPIPE = 13, SIG_DFL = 0 (POSIX constants, stable across all Unix platforms)
        unsafe extern "C" {
            fn signal(sig: i32, handler: usize) -> usize;
        }
        signal(13, 0);
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info
            .payload()
            .downcast_ref::<String>()
            .map(|s| s.as_str())
            .or_else(|| info.payload().downcast_ref::<&str>().copied())
            .unwrap_or("");

        if msg.contains("failed printing to stdout") {
            std::process::exit(0);
        }

        default_hook(info);
    }));
}
