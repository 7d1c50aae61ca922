//! Run report presenters.

use std::time::Duration;

use cartoon_orchestration::interfaces::{ReportPresenter, StopReport};

use crate::output::{format_cartoon_row, format_duration};
use crate::ui::{self, Status};

/// Human-readable presenter.
pub struct CLIReportPresenter {
    verbose: bool,
    quiet: bool,
}

impl CLIReportPresenter {
    /// `quiet` wins over `verbose`.
    #[must_use]
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }
}

impl ReportPresenter for CLIReportPresenter {
    fn present_report(&self, report: &StopReport, elapsed: Duration) {
        if self.quiet {
            println!("{}/{}", report.terminal, report.stopped);
            return;
        }

        ui::print_header("Cartoon pool");
        println!("Cartoons: {}", report.stopped);
        println!("Fires handled: {}", report.total_fires);
        println!("Elapsed: {}", format_duration(elapsed));

        if self.verbose {
            println!(
                "\n  {:<16} {:>6} {:>6} {:>9}  {:<9} outcome",
                "name", "budget", "fired", "remaining", "state"
            );
            println!("{:-<70}", "");
            for cartoon in &report.cartoons {
                println!("{}", format_cartoon_row(cartoon));
            }
            println!();
        }

        if report.terminal == report.stopped {
            ui::print_status(Status::Ok, &format!("all {} cartoons retired", report.stopped));
        } else {
            ui::print_status(
                Status::Warn,
                &format!(
                    "{} of {} cartoons cut short",
                    report.stopped - report.terminal,
                    report.stopped
                ),
            );
        }
    }

    fn present_error(&self, error: &str) {
        ui::print_status(Status::Error, error);
    }
}

/// Presenter printing the report as one JSON document.
pub struct JsonReportPresenter;

impl ReportPresenter for JsonReportPresenter {
    fn present_report(&self, report: &StopReport, elapsed: Duration) {
        let mut value = serde_json::to_value(report).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "elapsed_ms".into(),
                serde_json::Value::from(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
            );
        }
        println!("{value}");
    }

    fn present_error(&self, error: &str) {
        eprintln!("{}", serde_json::json!({ "error": error }));
    }
}
