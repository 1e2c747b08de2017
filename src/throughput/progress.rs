//! Human-readable progress lines emitted while a session runs.

use std::fmt;

/// One step of session progress, rendered by the caller via [`fmt::Display`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Capability checks are starting.
    ValidatingCandidates {
        /// Number of candidate URLs to probe.
        count: usize,
    },
    /// No candidate was reachable with range support.
    NoValidServer,
    /// Timed downloads are starting.
    TestingSpeeds {
        /// Number of viable candidates.
        viable: usize,
    },
    /// One candidate was measured.
    FileMeasured {
        /// Display name of the file.
        file_name: String,
        /// Measured throughput.
        speed_mbps: f64,
    },
    /// Final average over successful downloads.
    Average {
        /// Mean throughput.
        average_mbps: f64,
        /// Number of successful downloads in the mean.
        servers: usize,
    },
    /// Every download failed.
    AllTestsFailed,
    /// The session was cancelled before finishing.
    Cancelled,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidatingCandidates { count } => {
                write!(f, "Validating {count} candidate URL(s)...")
            }
            Self::NoValidServer => f.write_str("No valid server found."),
            Self::TestingSpeeds { viable } => write!(f, "Testing speeds on {viable} server(s)..."),
            Self::FileMeasured {
                file_name,
                speed_mbps,
            } => write!(f, "- {file_name}: {speed_mbps:.2} Mbps"),
            Self::Average {
                average_mbps,
                servers,
            } => write!(
                f,
                "Average speed: {average_mbps:.2} Mbps (based on {servers} server(s))"
            ),
            Self::AllTestsFailed => f.write_str("All tests failed."),
            Self::Cancelled => f.write_str("Speed test cancelled."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_measured_line_uses_two_decimals() {
        let event = ProgressEvent::FileMeasured {
            file_name: "archlinux-x86_64.iso".to_string(),
            speed_mbps: 93.456,
        };
        assert_eq!(event.to_string(), "- archlinux-x86_64.iso: 93.46 Mbps");
    }

    #[test]
    fn test_average_line_reports_server_count() {
        let event = ProgressEvent::Average {
            average_mbps: 15.0,
            servers: 2,
        };
        assert_eq!(
            event.to_string(),
            "Average speed: 15.00 Mbps (based on 2 server(s))"
        );
    }

    #[test]
    fn test_failure_summaries() {
        assert_eq!(ProgressEvent::NoValidServer.to_string(), "No valid server found.");
        assert_eq!(ProgressEvent::AllTestsFailed.to_string(), "All tests failed.");
    }
}
