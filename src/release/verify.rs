//! Existence checks and concurrent execution of a verification plan.

use std::sync::OnceLock;
use std::thread;

use log::debug;

use super::VerifyError;
use super::http::HttpProbe;
use super::plan::{VerificationTarget, index_url, update_package_target};
use super::releases_index::ReleasesIndex;

/// Outcome of a single existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Passed {
        url: String,
    },
    Failed {
        url: String,
        message: String,
        /// `None` when the request never got a response.
        status: Option<u16>,
    },
}

impl VerificationResult {
    pub fn url(&self) -> &str {
        match self {
            VerificationResult::Passed { url } | VerificationResult::Failed { url, .. } => url,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, VerificationResult::Passed { .. })
    }
}

/// Receives results as checks complete, from any check thread.
pub trait Observer: Sync {
    fn on_result(&self, result: &VerificationResult);

    /// Called once per plan target, whether it ran or was skipped.
    fn on_target_finished(&self) {}
}

/// What happened across a whole plan.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Results in plan order. An index target contributes up to two.
    pub results: Vec<VerificationResult>,
    /// Targets never started because the run was already failing.
    pub skipped: usize,
    /// The first fatal failure, if any.
    pub fatal: Option<VerifyError>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }
}

/// HEAD `url` and classify the response: only 200 counts as present.
pub fn verify_artifact_exists<H: HttpProbe + ?Sized>(
    http: &H,
    url: &str,
    failure_message: &str,
) -> VerificationResult {
    match http.head(url) {
        Ok(200) => VerificationResult::Passed {
            url: url.to_string(),
        },
        Ok(status) => VerificationResult::Failed {
            url: url.to_string(),
            message: failure_message.to_string(),
            status: Some(status),
        },
        Err(e) => {
            debug!("HEAD {} transport failure: {}", url, e);
            VerificationResult::Failed {
                url: url.to_string(),
                message: failure_message.to_string(),
                status: None,
            }
        }
    }
}

/// Shared state of one plan execution.
struct Run<'a, H: ?Sized, O: ?Sized> {
    http: &'a H,
    observer: &'a O,
    warn: bool,
    /// Set by the first fatal failure; doubles as the cancellation signal.
    fatal: OnceLock<VerifyError>,
}

impl<H: HttpProbe + ?Sized, O: Observer + ?Sized> Run<'_, H, O> {
    fn cancelled(&self) -> bool {
        self.fatal.get().is_some()
    }

    fn fail(&self, error: VerifyError) {
        if self.fatal.set(error).is_ok() {
            debug!("first fatal failure recorded, cancelling pending checks");
        }
    }

    fn record(&self, results: &mut Vec<VerificationResult>, result: VerificationResult) {
        debug!(
            "{} {}",
            if result.is_passed() { "present" } else { "missing" },
            result.url()
        );
        self.observer.on_result(&result);
        results.push(result);
    }

    /// Run one target; `None` means it was skipped.
    fn run_target(&self, target: &VerificationTarget) -> Option<Vec<VerificationResult>> {
        if self.cancelled() {
            debug!("skipping {}", target.url());
            return None;
        }

        let mut results = Vec::new();
        match target {
            VerificationTarget::Exists { url, message } => self.check_exists(&mut results, url, message),
            VerificationTarget::WindowsIndex { base_url } => self.check_index(&mut results, base_url),
        }
        Some(results)
    }

    fn check_exists(&self, results: &mut Vec<VerificationResult>, url: &str, message: &str) {
        let result = verify_artifact_exists(self.http, url, message);
        if let VerificationResult::Failed { status, .. } = &result {
            if !self.warn {
                self.fail(VerifyError::ArtifactNotFound {
                    url: url.to_string(),
                    message: message.to_string(),
                    status: *status,
                });
            }
        }
        self.record(results, result);
    }

    fn check_index(&self, results: &mut Vec<VerificationResult>, base_url: &str) {
        let url = index_url(base_url);
        let status = match self.http.get(&url, None) {
            Ok(response) if response.status == 200 => {
                debug!("{} contents:\n{}", url, response.body);
                self.record(results, VerificationResult::Passed { url: url.clone() });
                match ReleasesIndex::parse(&response.body) {
                    Ok(index) => {
                        debug!("{} lists {} packages", url, index.entries().len());
                        let package = update_package_target(base_url, index.update_filename());
                        if let Some(package_results) = self.run_target(&package) {
                            results.extend(package_results);
                        }
                    }
                    Err(e) => self.fail(e),
                }
                return;
            }
            Ok(response) => Some(response.status),
            Err(e) => {
                debug!("GET {} transport failure: {}", url, e);
                None
            }
        };

        self.record(
            results,
            VerificationResult::Failed {
                url,
                message: format!("{} could not be found", base_url),
                status,
            },
        );
        self.fail(VerifyError::IndexUnavailable {
            url: base_url.to_string(),
            status,
        });
    }
}

/// Run every target of `plan` concurrently, one scoped thread per target.
///
/// In warn mode missing artifacts are recorded and the run continues. A missing
/// or malformed `RELEASES` index is always fatal. Once a fatal failure happens,
/// targets that have not started are skipped; in-flight requests finish.
pub fn execute_plan<H, O>(http: &H, plan: &[VerificationTarget], warn: bool, observer: &O) -> RunReport
where
    H: HttpProbe + ?Sized,
    O: Observer + ?Sized,
{
    let run = Run {
        http,
        observer,
        warn,
        fatal: OnceLock::new(),
    };

    let outcomes: Vec<Option<Vec<VerificationResult>>> = thread::scope(|scope| {
        let run = &run;
        let handles: Vec<_> = plan
            .iter()
            .map(|target| {
                scope.spawn(move || {
                    let outcome = run.run_target(target);
                    run.observer.on_target_finished();
                    outcome
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    let mut report = RunReport::default();
    for outcome in outcomes {
        match outcome {
            Some(results) => report.results.extend(results),
            None => report.skipped += 1,
        }
    }
    report.fatal = run.fatal.into_inner();
    report
}
