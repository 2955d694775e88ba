//! Verify command: fetch the manifest, check version agreement, then check every artifact.

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::config::VerifyConfig;
use crate::release::http::{HttpProbe, ReqwestProbe};
use crate::release::manifest::{Manifest, check_version_agreement, fetch_latest_manifest};
use crate::release::plan::build_verification_plan;
use crate::release::verify::{Observer, RunReport, VerificationResult, execute_plan};
use crate::release::VerifyResult;

/// Run the verify command against the real network.
pub fn run(config: &VerifyConfig) -> Result<()> {
    let http = ReqwestProbe::new(config.timeout)?;
    run_with(&http, config)
}

/// Core of the command, generic over the HTTP layer for testability.
pub fn run_with<H: HttpProbe>(http: &H, config: &VerifyConfig) -> Result<()> {
    print!("[1] Verifying data files have identical most current version numbers ... ");
    io::stdout().flush()?;

    let (manifest, version) = match agreed_manifest(http, config) {
        Ok(agreed) => agreed,
        Err(e) => {
            println!("{}", "FAILED".red().bold());
            return Err(e.into());
        }
    };
    println!("{}", "OK".green());
    info!("{} entries agree on version {}", manifest.len(), version);

    println!("[2] Verifying file location and status");
    let plan = build_verification_plan(&manifest, &version, &config.cdn())?;

    let reporter = ConsoleReporter::new(plan.len() as u64);
    let report = execute_plan(http, &plan, config.warn, &reporter);
    reporter.finish();

    print_summary(&report, &version, config.warn);

    match report.fatal {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn agreed_manifest<H: HttpProbe>(http: &H, config: &VerifyConfig) -> VerifyResult<(Manifest, String)> {
    let manifest = fetch_latest_manifest(
        http,
        &config.host,
        config.channel,
        &config.protocol,
        &config.auth_token,
    )?;
    let version = check_version_agreement(&manifest)?;
    Ok((manifest, version))
}

/// Prints one line per check while a progress bar on stderr tracks completion.
struct ConsoleReporter {
    pb: ProgressBar,
}

impl ConsoleReporter {
    fn new(total: u64) -> Self {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[release-verify] Checking {pos}/{len} [{bar:30}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { pb }
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Observer for ConsoleReporter {
    fn on_result(&self, result: &VerificationResult) {
        let line = format_result(result);
        self.pb.suspend(|| println!("{}", line));
    }

    fn on_target_finished(&self) {
        self.pb.inc(1);
    }
}

fn format_result(result: &VerificationResult) -> String {
    match result {
        VerificationResult::Passed { url } => format!("  {} ... {}", "OK".green(), url),
        VerificationResult::Failed {
            url,
            message,
            status: Some(status),
        } => format!(
            "HTTP Status code: {} url: {}\n  {} ... {} : {}",
            status,
            url,
            "FAILED".red(),
            message,
            url
        ),
        VerificationResult::Failed {
            url,
            message,
            status: None,
        } => format!(
            "No response from {}\n  {} ... {} : {}",
            url,
            "FAILED".red(),
            message,
            url
        ),
    }
}

fn print_summary(report: &RunReport, version: &str, warn: bool) {
    println!();
    println!(
        "{} passed, {} failed, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped
    );

    if report.fatal.is_some() {
        println!("{} Release {} failed verification", "Failed!".red().bold(), version);
    } else if report.failed() > 0 && warn {
        println!(
            "{} Release {} has missing files (warn mode)",
            "Warning".yellow().bold(),
            version
        );
    } else {
        println!("{} Release {} verified", "Success!".green().bold(), version);
    }
}
