//! Console table and JSON report generation.

use crate::models::{BenchReport, KeySummary};
use anyhow::Result;

/// Inner widths of the table columns, padding included.
const COLUMN_WIDTHS: [usize; 5] = [22, 16, 13, 13, 10];

/// Render one table row.
///
/// Times are printed with five decimals and an `ms` suffix; the key is
/// padded to 20 characters and the count to 8.
pub fn format_row(key: &str, total: f64, mean: f64, max: f64, count: usize) -> String {
    format!(
        "┃ {:<20} │ {:>12.5}ms │ {:>9.5}ms │ {:>9.5}ms │ {:>8} ┃",
        key, total, mean, max, count
    )
}

fn format_summary_row(row: &KeySummary) -> String {
    let s = &row.summary;
    format_row(&row.key, s.total, s.mean, s.max, s.count)
}

fn rule(left: char, fill: char, sep: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, width) in COLUMN_WIDTHS.iter().enumerate() {
        if i > 0 {
            line.push(sep);
        }
        line.extend(std::iter::repeat(fill).take(*width));
    }
    line.push(right);
    line
}

/// Top border, column titles and separator.
pub fn table_header() -> String {
    let titles = format!(
        "┃ {:<20} │ {:<14} │ {:<11} │ {:<11} │ {:<8} ┃",
        "Key", "Total", "Average", "Maximum", "Count"
    );
    [rule('┏', '━', '┯', '┓'), titles, rule('┠', '─', '┼', '┨')].join("\n")
}

/// Bottom border.
pub fn table_footer() -> String {
    rule('┗', '━', '┷', '┛')
}

/// Generate the full console report.
pub fn generate_table_report(report: &BenchReport) -> String {
    let mut lines = Vec::with_capacity(report.rows.len() + 6);

    lines.push(format!("Path: {}", report.metadata.mod_path));
    if let Some(ref totals) = report.totals {
        lines.push(totals.line.clone());
    }
    lines.push(table_header());
    lines.extend(report.rows.iter().map(format_summary_row));
    lines.push(table_footer());

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &BenchReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parse_totals;
    use crate::models::{ProfileTotals, ReportMetadata, Source, Summary};
    use chrono::Utc;

    fn width(s: &str) -> usize {
        s.chars().count()
    }

    fn create_test_report(totals: Option<ProfileTotals>) -> BenchReport {
        BenchReport {
            metadata: ReportMetadata {
                mod_path: "/mods/cybersyn".to_string(),
                save: "bench".to_string(),
                runs: 2,
                ticks: 2,
                profiling: totals.is_some(),
                generated_at: Utc::now(),
                tool_version: "1.0.0".to_string(),
            },
            totals,
            rows: vec![KeySummary {
                key: "wholeUpdate".to_string(),
                source: Source::Benchmark,
                summary: Summary {
                    total: 3.0,
                    mean: 1.5,
                    max: 2.0,
                    count: 2,
                },
            }],
        }
    }

    #[test]
    fn test_format_row_scenario() {
        let row = format_row("wholeUpdate", 3.0, 1.5, 2.0, 2);
        assert_eq!(
            row,
            "┃ wholeUpdate          │      3.00000ms │   1.50000ms │   2.00000ms │        2 ┃"
        );
    }

    #[test]
    fn test_format_row_constant_width() {
        let reference = width(&format_row("k", 0.0, 0.0, 0.0, 0));
        let cases = [
            ("wholeUpdate", 3.0, 1.5, 2.0, 2),
            ("tick_poll_station", 12345.678901, 0.342938, 99.99999, 36000),
            ("a_nineteen_char_key", 0.000001, 0.1, 1.0, 12345678),
        ];
        for (key, total, mean, max, count) in cases {
            let row = format_row(key, total, mean, max, count);
            assert_eq!(width(&row), reference, "{row}");
        }
    }

    #[test]
    fn test_format_row_five_decimals() {
        let row = format_row("k", 1.0 / 3.0, 2.0 / 3.0, 0.125, 1);
        assert!(row.contains("0.33333ms"));
        assert!(row.contains("0.66667ms"));
        assert!(row.contains("0.12500ms"));
    }

    #[test]
    fn test_frame_matches_row_width() {
        let row_width = width(&format_row("k", 0.0, 0.0, 0.0, 0));
        for line in table_header().lines() {
            assert_eq!(width(line), row_width, "{line}");
        }
        assert_eq!(width(&table_footer()), row_width);
    }

    #[test]
    fn test_generate_table_report() {
        let table = generate_table_report(&create_test_report(None));
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "Path: /mods/cybersyn");
        assert!(lines[1].starts_with('┏'));
        assert!(lines[2].contains("Average"));
        assert!(lines[4].contains("wholeUpdate"));
        assert!(lines[5].starts_with('┗'));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_generate_table_report_with_totals() {
        let report = create_test_report(Some(parse_totals("tick_dispatch, 4")));
        let table = generate_table_report(&report);
        assert_eq!(table.lines().nth(1), Some(" Totals: tick_dispatch = 4"));
    }

    #[test]
    fn test_json_report_totals_are_structured() {
        let report = create_test_report(Some(parse_totals("tick_dispatch, 4\n")));
        let json: serde_json::Value =
            serde_json::from_str(&generate_json_report(&report).unwrap()).unwrap();

        assert_eq!(
            json["totals"],
            serde_json::json!({ "entries": [{ "name": "tick_dispatch", "value": "4" }] })
        );
        assert!(!json.to_string().contains("Totals:"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report(None)).unwrap();
        assert!(json.contains("\"mod_path\""));
        assert!(json.contains("\"rows\""));
        assert!(!json.contains("\"totals\""));
    }
}
