//! Harness for tests whose expected outcome is a process abort.
//!
//! An aborting call cannot be observed from inside the test that makes it,
//! so the parent test re-runs the current test binary, filtered down to a
//! single "dispatch" test, with [`CASE_ENV`] naming the scenario. The
//! dispatch test reads the variable via [`requested_case`] and performs the
//! violating call; without the variable it does nothing.
//!
//! ```ignore
//! #[test]
//! fn fatal_dispatch() {
//!     let Some(case) = aborts::requested_case() else { return };
//!     match case.as_str() {
//!         "get" => { vec.get(99); }
//!         other => panic!("unknown case {other}"),
//!     }
//! }
//!
//! #[test]
//! fn get_out_of_bounds_aborts() {
//!     aborts::assert_aborts("fatal_dispatch", "get", "index out of bounds");
//! }
//! ```

use std::process::Command;

/// Environment variable carrying the case name to the child process.
pub const CASE_ENV: &str = "ERVEC_ABORT_CASE";

/// The case this process was asked to run, if it is a child.
pub fn requested_case() -> Option<String> {
    std::env::var(CASE_ENV).ok()
}

/// What the child process did.
#[derive(Debug)]
pub struct ChildOutcome {
    /// Exit code, if the child exited rather than being killed.
    pub code: Option<i32>,
    /// Whether the child died from `SIGABRT` (always `false` off Unix).
    pub sigabrt: bool,
    /// Everything the child wrote to stderr.
    pub stderr: String,
}

impl ChildOutcome {
    /// Whether the child was terminated by an abort rather than exiting.
    pub fn aborted(&self) -> bool {
        if cfg!(unix) {
            self.sigabrt
        } else {
            self.code != Some(0)
        }
    }
}

/// Re-run the current test binary, executing only `dispatch_test` with
/// [`CASE_ENV`] set to `case`.
///
/// # Panics
///
/// Panics if the test binary cannot be located or spawned.
pub fn run_case(dispatch_test: &str, case: &str) -> ChildOutcome {
    let exe = std::env::current_exe().expect("current test binary path");
    let output = Command::new(exe)
        .args([dispatch_test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CASE_ENV, case)
        .output()
        .expect("spawn child test process");

    ChildOutcome {
        code: output.status.code(),
        sigabrt: sigabrt(&output.status),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

/// Assert that `case` aborts the process and reports `expected` on stderr.
///
/// # Panics
///
/// Panics (failing the calling test) if the child exits normally or its
/// stderr does not mention `expected`.
pub fn assert_aborts(dispatch_test: &str, case: &str, expected: &str) {
    let outcome = run_case(dispatch_test, case);
    assert!(
        outcome.aborted(),
        "case '{case}' did not abort (exit code {:?}); stderr:\n{}",
        outcome.code,
        outcome.stderr,
    );
    assert!(
        outcome.stderr.contains(expected),
        "case '{case}' aborted without reporting '{expected}'; stderr:\n{}",
        outcome.stderr,
    );
}

#[cfg(unix)]
fn sigabrt(status: &std::process::ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    // SIGABRT is 6 on every Unix Rust supports.
    status.signal() == Some(6)
}

#[cfg(not(unix))]
fn sigabrt(_status: &std::process::ExitStatus) -> bool {
    false
}
