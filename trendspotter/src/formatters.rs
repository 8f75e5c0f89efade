//! Report formatting for detection results.
//!
//! This module provides different formatters for detection reports, allowing
//! users to output results in various formats like JSON, human-readable text,
//! or Markdown for documentation purposes.
//!
//! # Examples
//!
//! ```rust
//! use trendspotter::formatters::{ReportFormatter, HumanFormatter};
//! use trendspotter::report::DetectionReport;
//!
//! let formatter = HumanFormatter::new();
//! let report = DetectionReport::empty("data");
//! let output = formatter.format(&report).unwrap();
//! ```

use std::fmt::Write;

use crate::error::{Result, SpotterError};
use crate::report::DetectionReport;

/// Configuration options for formatting detection reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include per-row flag vectors in output
    pub include_flags: bool,
    /// Include skipped detectors and their reasons
    pub include_skipped: bool,
    /// Maximum number of flagged rows to display (-1 for all)
    pub max_rows: i32,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include timestamps in output
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_flags: true,
            include_skipped: true,
            max_rows: -1, // Show all flagged rows by default
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the summary.
    pub fn minimal() -> Self {
        Self {
            include_flags: false,
            include_skipped: false,
            max_rows: 0,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            include_flags: true,
            include_skipped: true,
            max_rows: 50, // Limit output in CI
            use_colors: false,
            include_timestamps: true,
        }
    }

    /// Sets whether to include per-row flag vectors.
    pub fn with_flags(mut self, include: bool) -> Self {
        self.include_flags = include;
        self
    }

    /// Sets whether to include skipped detectors.
    pub fn with_skipped(mut self, include: bool) -> Self {
        self.include_skipped = include;
        self
    }

    /// Sets the maximum number of flagged rows to display.
    pub fn with_max_rows(mut self, max: i32) -> Self {
        self.max_rows = max;
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

/// Trait for formatting detection reports into different output formats.
///
/// # Examples
///
/// ```rust
/// use trendspotter::formatters::ReportFormatter;
/// use trendspotter::report::DetectionReport;
///
/// struct MyCustomFormatter;
///
/// impl ReportFormatter for MyCustomFormatter {
///     fn format(&self, report: &DetectionReport) -> trendspotter::error::Result<String> {
///         Ok(format!("{} anomalies", report.anomaly_count()))
///     }
/// }
/// ```
pub trait ReportFormatter {
    /// Formats a detection report into a string representation.
    fn format(&self, report: &DetectionReport) -> Result<String>;

    /// Formats a detection report with custom configuration.
    fn format_with_config(
        &self,
        report: &DetectionReport,
        _config: &FormatterConfig,
    ) -> Result<String> {
        // Default implementation ignores config and uses standard format
        self.format(report)
    }
}

/// Formats detection reports as structured JSON.
///
/// Suitable for programmatic consumption and integration with other tools.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    /// Creates a new JSON formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &DetectionReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &DetectionReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let filtered = filter_report(report, config);

        if self.pretty {
            serde_json::to_string_pretty(&filtered).map_err(|e| {
                SpotterError::Serialization(format!("failed to serialize report to JSON: {e}"))
            })
        } else {
            serde_json::to_string(&filtered).map_err(|e| {
                SpotterError::Serialization(format!("failed to serialize report to JSON: {e}"))
            })
        }
    }
}

/// Formats detection reports in a human-readable format for console output.
///
/// Includes a summary, per-detector vote counts, the flagged rows with the
/// detectors that voted for them, and any skipped detectors.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a new human formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    /// Creates a new human formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &DetectionReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &DetectionReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        let anomalies = report.anomaly_count();

        // Header
        writeln!(output).unwrap();
        if anomalies == 0 {
            if config.use_colors {
                writeln!(output, "✅ \x1b[32mNo anomalies detected\x1b[0m").unwrap();
            } else {
                writeln!(output, "✅ No anomalies detected").unwrap();
            }
        } else if config.use_colors {
            writeln!(
                output,
                "🚨 \x1b[31m{anomalies} anomalous rows detected\x1b[0m"
            )
            .unwrap();
        } else {
            writeln!(output, "🚨 {anomalies} anomalous rows detected").unwrap();
        }

        writeln!(output).unwrap();
        writeln!(output, "Table: {}", report.table).unwrap();

        if config.include_timestamps {
            writeln!(output, "Generated: {}", report.generated_at).unwrap();
        }

        // Summary statistics
        writeln!(output).unwrap();
        writeln!(output, "📊 Summary:").unwrap();
        writeln!(output, "   Rows Analyzed: {}", report.row_count).unwrap();
        writeln!(output, "   Detectors Ran: {}", report.detectors.len()).unwrap();
        writeln!(output, "   Detectors Skipped: {}", report.skipped.len()).unwrap();
        writeln!(
            output,
            "   Flagged: {} ({:.1}%)",
            anomalies,
            report.anomaly_percentage()
        )
        .unwrap();
        writeln!(output, "   Execution Time: {}ms", report.elapsed_ms).unwrap();

        // Per-detector vote counts
        if !report.detectors.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "🗳️  Votes by Detector:").unwrap();
            for detector in &report.detectors {
                let count = detector.flags.iter().filter(|f| **f).count();
                writeln!(output, "   {}: {} rows", detector.name, count).unwrap();
            }
        }

        // Flagged rows
        let flagged = flagged_rows(report);
        if config.include_flags && !flagged.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "🚩 Flagged Rows:").unwrap();

            let rows_to_show = if config.max_rows < 0 {
                flagged.as_slice()
            } else {
                let max = config.max_rows as usize;
                &flagged[..std::cmp::min(max, flagged.len())]
            };

            for (row, votes, names) in rows_to_show {
                writeln!(
                    output,
                    "   row {row}: {votes} votes ({})",
                    names.join(", ")
                )
                .unwrap();
            }

            if flagged.len() > rows_to_show.len() {
                writeln!(
                    output,
                    "   ... and {} more flagged rows",
                    flagged.len() - rows_to_show.len()
                )
                .unwrap();
            }
        }

        // Skipped detectors
        if config.include_skipped && !report.skipped.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "⏭️  Skipped Detectors:").unwrap();
            for skipped in &report.skipped {
                if config.use_colors {
                    writeln!(
                        output,
                        "   \x1b[33m{}\x1b[0m: {}",
                        skipped.name, skipped.reason
                    )
                    .unwrap();
                } else {
                    writeln!(output, "   {}: {}", skipped.name, skipped.reason).unwrap();
                }
            }
        }

        writeln!(output).unwrap();
        Ok(output)
    }
}

/// Formats detection reports as Markdown suitable for documentation.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    /// Creates a new Markdown formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    /// Creates a new Markdown formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the base heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &DetectionReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &DetectionReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut output = String::new();
        let h = "#".repeat(self.heading_level as usize);
        let anomalies = report.anomaly_count();

        // Main heading
        if anomalies == 0 {
            writeln!(output, "{h} ✅ Anomaly Report - clean").unwrap();
        } else {
            writeln!(output, "{h} 🚨 Anomaly Report - {anomalies} flagged").unwrap();
        }

        writeln!(output).unwrap();
        writeln!(output, "**Table:** {}", report.table).unwrap();

        if config.include_timestamps {
            writeln!(output, "**Generated:** {}", report.generated_at).unwrap();
        }

        // Summary table
        writeln!(output).unwrap();
        writeln!(output, "{h}# Summary").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Rows Analyzed | {} |", report.row_count).unwrap();
        writeln!(output, "| Detectors Ran | {} |", report.detectors.len()).unwrap();
        writeln!(output, "| Detectors Skipped | {} |", report.skipped.len()).unwrap();
        writeln!(
            output,
            "| Flagged | {} ({:.1}%) |",
            anomalies,
            report.anomaly_percentage()
        )
        .unwrap();
        writeln!(output, "| Execution Time | {}ms |", report.elapsed_ms).unwrap();

        // Vote counts
        if !report.detectors.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "{h}# Votes by Detector").unwrap();
            writeln!(output).unwrap();
            writeln!(output, "| Detector | Flagged Rows |").unwrap();
            writeln!(output, "|----------|--------------|").unwrap();
            for detector in &report.detectors {
                let count = detector.flags.iter().filter(|f| **f).count();
                writeln!(output, "| {} | {} |", detector.name, count).unwrap();
            }
        }

        // Flagged rows
        let flagged = flagged_rows(report);
        if config.include_flags && !flagged.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "{h}# Flagged Rows").unwrap();
            writeln!(output).unwrap();
            writeln!(output, "| Row | Votes | Detectors |").unwrap();
            writeln!(output, "|-----|-------|-----------|").unwrap();

            let rows_to_show = if config.max_rows < 0 {
                flagged.as_slice()
            } else {
                let max = config.max_rows as usize;
                &flagged[..std::cmp::min(max, flagged.len())]
            };

            for (row, votes, names) in rows_to_show {
                writeln!(output, "| {row} | {votes} | {} |", names.join(", ")).unwrap();
            }

            if flagged.len() > rows_to_show.len() {
                writeln!(output).unwrap();
                writeln!(
                    output,
                    "> **Note:** {} additional flagged rows not shown in this report.",
                    flagged.len() - rows_to_show.len()
                )
                .unwrap();
            }
        }

        // Skipped detectors
        if config.include_skipped && !report.skipped.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "{h}# Skipped Detectors").unwrap();
            writeln!(output).unwrap();
            writeln!(output, "| Detector | Reason |").unwrap();
            writeln!(output, "|----------|--------|").unwrap();
            for skipped in &report.skipped {
                writeln!(output, "| {} | {} |", skipped.name, skipped.reason).unwrap();
            }
        }

        writeln!(output).unwrap();
        Ok(output)
    }
}

/// Collects the flagged rows with vote counts and the voting detectors.
fn flagged_rows(report: &DetectionReport) -> Vec<(usize, u32, Vec<&str>)> {
    report
        .anomaly_any
        .iter()
        .enumerate()
        .filter(|(_, flagged)| **flagged)
        .map(|(row, _)| {
            let names: Vec<&str> = report
                .detectors
                .iter()
                .filter(|d| d.flags.get(row).copied().unwrap_or(false))
                .map(|d| d.name.as_str())
                .collect();
            (row, report.votes.get(row).copied().unwrap_or(0), names)
        })
        .collect()
}

/// Helper function to filter a detection report based on configuration.
fn filter_report(report: &DetectionReport, config: &FormatterConfig) -> DetectionReport {
    let mut filtered = report.clone();

    if !config.include_flags {
        for detector in &mut filtered.detectors {
            detector.flags.clear();
        }
        filtered.votes.clear();
        filtered.anomaly_any.clear();
    }

    if !config.include_skipped {
        filtered.skipped.clear();
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::Unavailable;
    use crate::ensemble::{aggregate, DetectorRun};

    fn create_test_report() -> DetectionReport {
        let runs = vec![
            DetectorRun::new(
                "outlier_zscore",
                Ok(vec![false, false, false, false, true]),
            ),
            DetectorRun::new("outlier_iqr", Ok(vec![false, true, false, false, true])),
            DetectorRun::new("anomaly_lof", Ok(vec![false, false, false, false, false])),
            DetectorRun::new("anomaly_cluster_dist", Err(Unavailable::NoVariance)),
        ];
        let mut report = aggregate("events", 5, runs);
        report.elapsed_ms = 42;
        report
    }

    #[test]
    fn test_formatter_config() {
        let config = FormatterConfig::default();
        assert!(config.include_flags);
        assert!(config.include_skipped);
        assert!(config.use_colors);

        let minimal = FormatterConfig::minimal();
        assert!(!minimal.include_flags);
        assert!(!minimal.use_colors);

        let ci = FormatterConfig::ci();
        assert!(!ci.use_colors);
        assert_eq!(ci.max_rows, 50);
    }

    #[test]
    fn test_json_formatter() {
        let report = create_test_report();
        let formatter = JsonFormatter::new();

        let output = formatter.format(&report).unwrap();
        assert!(output.contains("\"table\": \"events\""));
        assert!(output.contains("outlier_zscore"));
        assert!(output.contains("anomaly_any"));

        let compact = JsonFormatter::new().with_pretty(false).format(&report).unwrap();
        assert!(compact.contains("\"table\":\"events\""));
    }

    #[test]
    fn test_json_formatter_minimal_drops_flags() {
        let report = create_test_report();
        let formatter = JsonFormatter::new();
        let config = FormatterConfig::minimal();

        let output = formatter.format_with_config(&report, &config).unwrap();
        assert!(output.contains("\"votes\": []"));
        // Skipped detectors are dropped along with their reasons.
        assert!(!output.contains("no_variance"));
        assert!(!output.contains("anomaly_cluster_dist"));
    }

    #[test]
    fn test_human_formatter() {
        let report = create_test_report();
        let formatter = HumanFormatter::new();

        let output = formatter.format(&report).unwrap();
        assert!(output.contains("1 anomalous rows detected"));
        assert!(output.contains("Table: events"));
        assert!(output.contains("Rows Analyzed: 5"));
        assert!(output.contains("row 4: 2 votes (outlier_zscore, outlier_iqr)"));
        assert!(output.contains("anomaly_cluster_dist"));

        // Test without colors
        let config = FormatterConfig::default().with_colors(false);
        let output = formatter.format_with_config(&report, &config).unwrap();
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_human_formatter_clean_report() {
        let runs = vec![DetectorRun::new(
            "outlier_zscore",
            Ok(vec![false, false, false]),
        )];
        let report = aggregate("events", 3, runs);
        let formatter = HumanFormatter::new();
        let output = formatter.format(&report).unwrap();
        assert!(output.contains("No anomalies detected"));
    }

    #[test]
    fn test_markdown_formatter() {
        let report = create_test_report();
        let formatter = MarkdownFormatter::new();

        let output = formatter.format(&report).unwrap();
        assert!(output.contains("## 🚨 Anomaly Report - 1 flagged"));
        assert!(output.contains("**Table:** events"));
        assert!(output.contains("| Rows Analyzed | 5 |"));
        assert!(output.contains("| outlier_zscore | 1 |"));
        assert!(output.contains("| 4 | 2 | outlier_zscore, outlier_iqr |"));

        // Test with different heading level
        let formatter = MarkdownFormatter::new().with_heading_level(1);
        let output = formatter.format(&report).unwrap();
        assert!(output.contains("# 🚨 Anomaly Report - 1 flagged"));
    }

    #[test]
    fn test_config_max_rows() {
        let runs = vec![
            DetectorRun::new("outlier_zscore", Ok(vec![true, true, true])),
            DetectorRun::new("outlier_iqr", Ok(vec![true, true, true])),
        ];
        let report = aggregate("events", 3, runs);
        let config = FormatterConfig::default().with_max_rows(1);

        let formatter = HumanFormatter::new();
        let output = formatter.format_with_config(&report, &config).unwrap();
        assert!(output.contains("row 0"));
        assert!(output.contains("... and 2 more flagged rows"));
    }
}
