//! Output formatting and display system
//!
//! Live progress lines are written while cases run; the final report is
//! rendered as text tables (plain or colored) or as JSON.

mod colored;
mod formatter;
mod progress;

pub use colored::{ColorScheme, ColoredFormatter};
pub use formatter::{Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat};
pub use progress::{ConsoleProgress, ProgressReporter, SilentProgress};

use crate::{error::Result, models::RunReport};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter + Send> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
            max_anomalies_shown: if verbose { 64 } else { 10 },
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter + Send> {
        Self::create_formatter(false, true)
    }

    /// Progress reporter matching the output mode
    ///
    /// JSON mode keeps stdout for the report alone.
    pub fn create_progress(json_output: bool, enable_color: bool) -> Box<dyn ProgressReporter + Send> {
        if json_output {
            Box::new(SilentProgress)
        } else {
            Box::new(ConsoleProgress::stdio(enable_color))
        }
    }
}

/// Main output coordinator that renders the final report
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter + Send>,
    json: bool,
}

impl OutputCoordinator {
    pub fn new(formatter: Box<dyn OutputFormatter + Send>) -> Self {
        Self { formatter, json: false }
    }

    /// Render reports as JSON instead of text
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Render the complete run report
    pub fn display_report(&self, report: &RunReport) -> Result<String> {
        if self.json {
            return render_json(report);
        }

        let mut sections = vec![
            self.formatter.format_header("RX Timestamp Gap Test Results")?,
            self.formatter.format_run_info(report)?,
            self.formatter.format_case_table(&report.cases)?,
        ];

        let details: Vec<String> = report
            .cases
            .iter()
            .filter(|c| !c.outcome.is_pass())
            .map(|c| self.formatter.format_anomalies(c))
            .collect::<Result<_>>()?;
        if !details.is_empty() {
            sections.push(details.join("\n"));
        }

        sections.push(self.formatter.format_summary(&report.summary)?);
        sections.push(self.formatter.format_verdict(report)?);

        Ok(sections.join("\n\n"))
    }

    /// One-line verdict, for the end of a long progress log
    pub fn display_verdict(&self, report: &RunReport) -> Result<String> {
        self.formatter.format_verdict(report)
    }
}

/// Serialize a run report as pretty-printed JSON
pub fn render_json(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
