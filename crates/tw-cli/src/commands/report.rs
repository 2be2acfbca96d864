//! Report command for tool window duration statistics.
//!
//! This module implements `tw report`: it runs the analysis pipeline and
//! prints the pair counts, an overlaid log-scale histogram and the summary
//! table, or the same data as JSON.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tw_core::{
    Analysis, AnalysisOptions, Category, DurationSummary, LoadReport, OverlaidHistogram,
    Summaries, Tally,
};

use crate::Config;

/// Width of the dashed rules around the summary table.
const TABLE_WIDTH: usize = 110;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Usage log to analyse (defaults to the configured `input_path`).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Number of histogram bins.
    #[arg(long)]
    pub bins: Option<usize>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Skip the histogram.
    #[arg(long)]
    pub no_histogram: bool,

    /// Fail if any close precedes its open instead of skipping the pair.
    #[arg(long)]
    pub strict: bool,
}

// ========== Text Output ==========

/// Formats the dataset size and pair counts printed before the report.
pub fn format_preamble(analysis: &Analysis) -> String {
    let mut output = String::new();
    writeln!(output, "Length of data: {}", analysis.events).unwrap();
    writeln!(output, "Users: {}", analysis.users).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Manual open pairs: {}", analysis.pairs.manual_count()).unwrap();
    writeln!(output, "Auto open pairs: {}", analysis.pairs.auto_count()).unwrap();
    writeln!(output).unwrap();
    output
}

/// Scales a density to a bar length.
///
/// Non-zero densities get at least one block so sparse bins stay visible.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn bar_length(density: f64, max_density: f64, width: usize) -> usize {
    if max_density <= 0.0 || density <= 0.0 {
        return 0;
    }
    let scaled = (density / max_density * width as f64).round() as usize;
    scaled.clamp(1, width.max(1))
}

/// Draws two bars on top of each other.
///
/// `█` where both series reach, then `▓` for a longer manual bar or `░` for a
/// longer auto bar.
pub fn overlay_bar(manual: usize, auto: usize) -> String {
    let both = manual.min(auto);
    let (tail, glyph) = if manual > auto {
        (manual - both, "▓")
    } else {
        (auto - both, "░")
    };
    format!("{}{}", "█".repeat(both), glyph.repeat(tail))
}

/// Formats the overlaid histogram, one line per bin labelled by its lower edge.
pub fn format_histogram(histogram: &OverlaidHistogram, width: usize) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "Overlayed Distribution of Tool Window Durations (log scale)"
    )
    .unwrap();
    writeln!(
        output,
        "Log10(Duration + 1) [ms] by density  (█ both  ▓ Manual  ░ Auto)"
    )
    .unwrap();
    writeln!(output).unwrap();

    let max = histogram.max_density();
    for bin in &histogram.bins {
        let manual = bar_length(bin.manual_density, max, width);
        let auto = bar_length(bin.auto_density, max, width);
        writeln!(output, "{:>6.2} │{}", bin.start, overlay_bar(manual, auto)).unwrap();
    }
    if let Some(last) = histogram.bins.last() {
        writeln!(output, "{:>6.2} ┘", last.end).unwrap();
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Manual n={}  Auto n={}  max density {:.2}",
        histogram.manual_total, histogram.auto_total, max
    )
    .unwrap();
    writeln!(output).unwrap();
    output
}

fn format_summary_row(output: &mut String, category: Category, summary: Option<&DurationSummary>) {
    let label = category.label();
    let Some(s) = summary else {
        writeln!(output, "{label:<10}{:>10}", "no data").unwrap();
        return;
    };
    writeln!(
        output,
        "{label:<10}{:>10}{:>12.2}{:>12.2}{:>14.2}{:>12.2}{:>14.2}{:>12.2}{:>12.2}",
        s.count, s.mean_s, s.median_s, s.std_s, s.log_mean, s.log_median, s.p5_s, s.p95_s
    )
    .unwrap();
}

/// Formats the fixed-width summary table.
pub fn format_summary_table(summaries: &Summaries) -> String {
    let rule = "-".repeat(TABLE_WIDTH);
    let mut output = String::new();

    writeln!(output, "Tool Window Usage Summary").unwrap();
    writeln!(output, "{rule}").unwrap();
    writeln!(
        output,
        "{:<10}{:>10}{:>12}{:>12}{:>14}{:>12}{:>14}{:>12}{:>12}",
        "Open Type",
        "Count",
        "Mean (s)",
        "Median (s)",
        "Std Dev (s)",
        "Log Mean",
        "Log Median",
        "P5 (s)",
        "P95 (s)"
    )
    .unwrap();
    writeln!(output, "{rule}").unwrap();
    for category in [Category::Manual, Category::Auto] {
        format_summary_row(&mut output, category, summaries.get(category));
    }
    output
}

/// Formats the full human-readable report.
pub fn format_report(analysis: &Analysis, histogram_width: Option<usize>) -> String {
    let mut output = format_preamble(analysis);
    if let (Some(width), Some(histogram)) = (histogram_width, &analysis.histogram) {
        output.push_str(&format_histogram(histogram, width));
    }
    output.push_str(&format_summary_table(&analysis.summaries));
    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub events: usize,
    pub users: usize,
    pub load: &'a LoadReport,
    pub tally: &'a Tally,
    pub manual: Option<&'a DurationSummary>,
    pub auto: Option<&'a DurationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<&'a OverlaidHistogram>,
}

/// Formats the analysis as JSON.
pub fn format_report_json(analysis: &Analysis, include_histogram: bool) -> Result<String> {
    let report = JsonReport {
        events: analysis.events,
        users: analysis.users,
        load: &analysis.load,
        tally: &analysis.pairs.tally,
        manual: analysis.summaries.get(Category::Manual),
        auto: analysis.summaries.get(Category::Auto),
        histogram: analysis
            .histogram
            .as_ref()
            .filter(|_| include_histogram),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let input = args.input.as_ref().unwrap_or(&config.input_path);
    let options = AnalysisOptions {
        bins: args.bins.unwrap_or(config.histogram_bins),
        strict: args.strict,
    };
    tracing::debug!(input = ?input, ?options, "running analysis");

    let analysis = Analysis::from_path(input, &options)
        .with_context(|| format!("failed to analyse {}", input.display()))?;

    if analysis.load.skipped_non_numeric > 0 || analysis.load.skipped_unknown_kind > 0 {
        tracing::info!(
            non_numeric = analysis.load.skipped_non_numeric,
            unknown_kind = analysis.load.skipped_unknown_kind,
            "skipped rows while loading"
        );
    }

    if args.json {
        let output = format_report_json(&analysis, !args.no_histogram)?;
        writeln!(writer, "{output}")?;
    } else {
        let width = (!args.no_histogram).then_some(config.histogram_width);
        write!(writer, "{}", format_report(&analysis, width))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use tw_core::{Event, LoadedEvents, OpenType};

    fn analysis_of(manual: &[i64], auto: &[i64], bins: usize) -> Analysis {
        let mut events = Vec::new();
        let mut user = 0;
        for (durations, open_type) in [(manual, OpenType::Manual), (auto, OpenType::Auto)] {
            for &duration in durations {
                user += 1;
                events.push(Event::opened(1_000, open_type, user));
                events.push(Event::closed(1_000 + duration, user));
            }
        }
        let options = AnalysisOptions {
            bins,
            strict: true,
        };
        Analysis::from_events(&LoadedEvents::from_events(events), &options).unwrap()
    }

    // ========== Preamble Tests ==========

    #[test]
    fn test_preamble_counts_pairs() {
        let analysis = analysis_of(&[50], &[60], 10);

        assert_eq!(
            format_preamble(&analysis),
            "Length of data: 4\nUsers: 2\n\nManual open pairs: 1\nAuto open pairs: 1\n\n"
        );
    }

    // ========== Histogram Tests ==========

    #[test]
    fn test_bar_length_scales_to_width() {
        assert_eq!(bar_length(1.0, 1.0, 10), 10);
        assert_eq!(bar_length(0.5, 1.0, 10), 5);
        assert_eq!(bar_length(0.0, 1.0, 10), 0);
    }

    #[test]
    fn test_bar_length_minimum_one_block() {
        assert_eq!(bar_length(0.01, 1.0, 10), 1);
    }

    #[test]
    fn test_bar_length_zero_max() {
        assert_eq!(bar_length(0.5, 0.0, 10), 0);
    }

    #[test]
    fn test_overlay_bar() {
        assert_eq!(overlay_bar(3, 5), "███░░");
        assert_eq!(overlay_bar(4, 1), "█▓▓▓");
        assert_eq!(overlay_bar(2, 2), "██");
        assert_eq!(overlay_bar(0, 0), "");
    }

    #[test]
    fn test_histogram_rendering() {
        // log10(d + 1): manual 0 and 1, auto 1 and 2, two bins of width 1
        let histogram = OverlaidHistogram::build(&[0, 9], &[9, 99], 2).unwrap();

        let output = format_histogram(&histogram, 10);
        assert_snapshot!(output);
    }

    // ========== Summary Table Tests ==========

    #[test]
    fn test_summary_table() {
        let analysis = analysis_of(&[1_200, 45_000, 800, 15_000, 3_000], &[150, 200, 90_000], 10);

        let output = format_summary_table(&analysis.summaries);
        assert_snapshot!(output);
    }

    #[test]
    fn test_summary_table_empty_category() {
        let analysis = analysis_of(&[1_000, 2_000, 3_000, 4_000], &[], 10);

        let output = format_summary_table(&analysis.summaries);
        assert_snapshot!(output);
    }

    #[test]
    fn test_summary_table_rules_are_fixed_width() {
        let output = format_summary_table(&Summaries::default());
        let rules: Vec<_> = output.lines().filter(|l| l.starts_with('-')).collect();

        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.len() == TABLE_WIDTH));
    }

    #[test]
    fn test_report_omits_histogram_when_disabled() {
        let analysis = analysis_of(&[50], &[60], 10);

        let with = format_report(&analysis, Some(20));
        let without = format_report(&analysis, None);
        assert!(with.contains("Overlayed Distribution"));
        assert!(!without.contains("Overlayed Distribution"));
        assert!(without.ends_with(&format_summary_table(&analysis.summaries)));
    }

    // ========== JSON Tests ==========

    #[test]
    fn test_report_json_output() {
        let analysis = analysis_of(&[50], &[], 4);

        let json: serde_json::Value =
            serde_json::from_str(&format_report_json(&analysis, true).unwrap()).unwrap();

        assert_eq!(json["events"], 2);
        assert_eq!(json["tally"]["manual"], 1);
        assert_eq!(json["manual"]["count"], 1);
        assert!(json["auto"].is_null());
        assert_eq!(json["histogram"]["bins"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_report_json_without_histogram() {
        let analysis = analysis_of(&[50], &[60], 4);

        let json: serde_json::Value =
            serde_json::from_str(&format_report_json(&analysis, false).unwrap()).unwrap();

        assert!(json.get("histogram").is_none());
    }

    // ========== Command Tests ==========

    #[test]
    fn test_run_reads_configured_input() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("toolwindow_data.csv");
        std::fs::write(
            &input,
            "100,opened,manual,1\n150,closed,manual,1\n200,opened,auto,1\n260,closed,auto,1\n",
        )
        .unwrap();
        let config = Config {
            input_path: input,
            ..Config::default()
        };
        let args = ReportArgs {
            input: None,
            bins: Some(5),
            json: false,
            no_histogram: true,
            strict: false,
        };

        let mut output = Vec::new();
        run(&mut output, &args, &config).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Length of data: 4\nUsers: 1\n"));
        assert!(output.contains("Manual open pairs: 1\nAuto open pairs: 1\n"));
        assert!(output.contains("Tool Window Usage Summary"));
    }

    #[test]
    fn test_run_fails_on_missing_input() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            input_path: temp.path().join("missing.csv"),
            ..Config::default()
        };
        let args = ReportArgs {
            input: None,
            bins: None,
            json: false,
            no_histogram: false,
            strict: false,
        };

        let err = run(&mut Vec::new(), &args, &config).unwrap_err();
        assert!(err.to_string().contains("missing.csv"));
    }
}
