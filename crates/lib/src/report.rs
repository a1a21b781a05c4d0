//! Engine result interpretation.
//!
//! The engine reports the number of POJOs that failed their checks through
//! its exit status. A child that dies without an exit code, or exits with a
//! negative one, is reported as abnormal so a crash is never read as a count.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::supervisor::ProcessOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report {
  /// Every POJO passed.
  Passed,

  /// `count` POJOs had errors.
  PojoErrors { count: u32 },

  /// The engine did not finish normally.
  Abnormal { outcome: ProcessOutcome },
}

impl Report {
  pub fn from_outcome(outcome: ProcessOutcome) -> Self {
    match outcome {
      ProcessOutcome::Exited { code: 0 } => Report::Passed,
      ProcessOutcome::Exited { code } if code > 0 => Report::PojoErrors { count: code.unsigned_abs() },
      other => Report::Abnormal { outcome: other },
    }
  }

  /// Number of failing POJOs; abnormal runs report none.
  pub fn error_count(&self) -> u32 {
    match self {
      Report::PojoErrors { count } => *count,
      Report::Passed | Report::Abnormal { .. } => 0,
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Report::Passed)
  }

  /// Log the summary line for this report.
  pub fn log(&self) {
    match self {
      Report::Passed => info!("all pojos passed"),
      Report::PojoErrors { count } => info!(errors = count, "{count} pojos had errors"),
      Report::Abnormal { outcome } => warn!(outcome = ?outcome, "test engine terminated abnormally"),
    }
  }
}

impl std::fmt::Display for Report {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Report::Passed => write!(f, "all pojos passed"),
      Report::PojoErrors { count } => write!(f, "{count} pojos had errors"),
      Report::Abnormal {
        outcome: ProcessOutcome::Exited { code },
      } => write!(f, "test engine exited abnormally with code {code}"),
      Report::Abnormal {
        outcome: ProcessOutcome::Terminated { signal: Some(signal) },
      } => write!(f, "test engine was killed by signal {signal}"),
      Report::Abnormal {
        outcome: ProcessOutcome::Terminated { signal: None },
      } => write!(f, "test engine was terminated"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tracing_test::traced_test;

  #[test]
  fn zero_exit_is_passed() {
    let report = Report::from_outcome(ProcessOutcome::Exited { code: 0 });
    assert_eq!(report, Report::Passed);
    assert_eq!(report.error_count(), 0);
    assert!(report.is_success());
  }

  #[test]
  fn positive_exit_is_error_count() {
    let report = Report::from_outcome(ProcessOutcome::Exited { code: 4 });
    assert_eq!(report, Report::PojoErrors { count: 4 });
    assert_eq!(report.error_count(), 4);
    assert!(!report.is_success());
    assert_eq!(report.to_string(), "4 pojos had errors");
  }

  #[test]
  fn negative_exit_is_abnormal() {
    let outcome = ProcessOutcome::Exited { code: -1 };
    let report = Report::from_outcome(outcome);
    assert_eq!(report, Report::Abnormal { outcome });
    assert_eq!(report.error_count(), 0);
  }

  #[test]
  fn signal_is_abnormal() {
    let report = Report::from_outcome(ProcessOutcome::Terminated { signal: Some(9) });
    assert_eq!(report.to_string(), "test engine was killed by signal 9");
  }

  #[test]
  #[traced_test]
  fn log_reports_error_count() {
    Report::PojoErrors { count: 2 }.log();
    assert!(logs_contain("2 pojos had errors"));
  }

  #[test]
  #[traced_test]
  fn log_reports_abnormal_termination() {
    Report::Abnormal {
      outcome: ProcessOutcome::Terminated { signal: None },
    }
    .log();
    assert!(logs_contain("terminated abnormally"));
  }

  #[test]
  fn serializes_with_status_tag() {
    let json = serde_json::to_value(Report::PojoErrors { count: 3 }).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "pojo_errors", "count": 3 }));
  }
}
