//! Formatting and reporting for health check results

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::aggregator::{Aggregation, ServiceResult, Verdict};

/// Marker prefixed to the line flagging an unhealthy service
pub const UNHEALTHY_MARKER: &str = "[UNHEALTHY]";

/// Output layout for the terminal report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// One line per event, as produced by [`render`]
    #[default]
    Lines,
    /// Summary table with colored status cells
    Table,
}

/// Renders the line-oriented report for `results`
///
/// The output is a pure function of its input: no timestamps and no color
/// codes.
pub fn render(results: &[ServiceResult]) -> String {
    write_lines(results, false)
}

fn write_lines(results: &[ServiceResult], colorize: bool) -> String {
    let mut output = String::new();

    for result in results {
        output.push_str(&format!("Checking health status for {}:\n", result.service));

        for event in &result.events {
            output.push_str(&format!(
                "  Service: {}, Event ID: {}, Status: {}\n",
                event.service, event.event_id, event.status
            ));
        }

        if !result.healthy {
            let marker = if colorize {
                UNHEALTHY_MARKER.red().bold().to_string()
            } else {
                UNHEALTHY_MARKER.to_string()
            };
            output.push_str(&format!(
                "  {} {} is reported as unhealthy.\n",
                marker, result.service
            ));
        }
    }

    output.push('\n');
    output.push_str(summary_line(Verdict::from_results(results)));
    output.push('\n');
    output
}

fn summary_line(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Healthy => "All services are healthy.",
        Verdict::Unhealthy => "One or more services are unhealthy.",
    }
}

/// Formats an aggregation as a pretty table followed by a summary
pub fn format_table(aggregation: &Aggregation) -> String {
    let mut builder = Builder::default();

    builder.push_record(["Service", "Status", "Events", "Event IDs"]);

    for result in &aggregation.results {
        let status = if result.healthy {
            "HEALTHY".green().to_string()
        } else {
            "UNHEALTHY".red().to_string()
        };
        let event_ids = result
            .events
            .iter()
            .map(|event| format!("{} ({})", event.event_id, event.status.as_colored_str()))
            .collect::<Vec<_>>()
            .join("\n");

        builder.push_record([
            result.service.to_string(),
            status,
            result.events.len().to_string(),
            event_ids,
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    let mut output = String::new();
    output.push_str(&table.to_string());
    output.push('\n');
    output.push_str(&format_summary(aggregation));
    output
}

/// Formats the summary section of the table report
fn format_summary(aggregation: &Aggregation) -> String {
    let mut summary = String::new();

    summary.push_str(&format!("\n{}\n", "Summary".bold().underline()));
    summary.push_str(&format!(
        "  Services checked: {}\n",
        aggregation.results.len()
    ));
    summary.push_str(&format!(
        "  {} Healthy: {}\n",
        "✓".green(),
        aggregation.healthy_count()
    ));

    if aggregation.unhealthy_count() > 0 {
        summary.push_str(&format!(
            "  {} Unhealthy: {}\n",
            "✗".red(),
            aggregation.unhealthy_count()
        ));
    }

    if !aggregation.unmatched.is_empty() {
        summary.push_str(&format!(
            "  {} Unmatched events: {}\n",
            "⚠".yellow(),
            aggregation.unmatched.len()
        ));
    }

    summary.push('\n');
    match aggregation.verdict() {
        Verdict::Healthy => {
            summary.push_str(&format!("  {}\n", "Overall: HEALTHY".green().bold()));
        }
        Verdict::Unhealthy => {
            summary.push_str(&format!("  {}\n", "Overall: UNHEALTHY".red().bold()));
        }
    }

    summary
}

/// Prints a report to stdout in the requested format
pub fn print_report(aggregation: &Aggregation, format: ReportFormat) {
    match format {
        ReportFormat::Lines => print!("{}", write_lines(&aggregation.results, true)),
        ReportFormat::Table => print!("{}", format_table(aggregation)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::aggregator::aggregate;
    use crate::health::event::{EventStatus, HealthEvent, ServiceName};

    fn names(list: &[&str]) -> Vec<ServiceName> {
        list.iter().copied().map(ServiceName::from).collect()
    }

    #[test]
    fn test_render_unhealthy_report() {
        let events = vec![
            HealthEvent::new("S3", "E1", EventStatus::Ok),
            HealthEvent::new("EC2", "E2", EventStatus::Open),
        ];
        let agg = aggregate(&names(&["S3", "EC2"]), events).unwrap();

        let expected = "\
Checking health status for S3:
  Service: S3, Event ID: E1, Status: ok
Checking health status for EC2:
  Service: EC2, Event ID: E2, Status: open
  [UNHEALTHY] EC2 is reported as unhealthy.

One or more services are unhealthy.
";
        assert_eq!(render(&agg.results), expected);
    }

    #[test]
    fn test_render_healthy_without_events() {
        let agg = aggregate(&names(&["S3"]), Vec::new()).unwrap();

        assert_eq!(
            render(&agg.results),
            "Checking health status for S3:\n\nAll services are healthy.\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let events = vec![
            HealthEvent::new("S3", "E3", EventStatus::Upcoming),
            HealthEvent::new("S3", "E1", EventStatus::Unknown),
        ];
        let agg = aggregate(&names(&["S3", "EC2"]), events).unwrap();

        assert_eq!(render(&agg.results), render(&agg.results));
    }

    #[test]
    fn test_render_has_no_color_codes() {
        let events = vec![HealthEvent::new("EC2", "E2", EventStatus::Open)];
        let agg = aggregate(&names(&["EC2"]), events).unwrap();

        assert!(!render(&agg.results).contains('\u{1b}'));
    }

    #[test]
    fn test_table_mentions_every_service() {
        colored::control::set_override(false);
        let events = vec![
            HealthEvent::new("EC2", "E2", EventStatus::Open),
            HealthEvent::new("RDS", "E3", EventStatus::Open),
        ];
        let agg = aggregate(&names(&["S3", "EC2"]), events).unwrap();

        let table = format_table(&agg);
        assert!(table.contains("S3"));
        assert!(table.contains("EC2"));
        assert!(table.contains("E2 (open)"));
        assert!(table.contains("Unmatched events: 1"));
        assert!(table.contains("Overall: UNHEALTHY"));
    }
}
