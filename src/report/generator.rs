//! Markdown and JSON report generation.
//!
//! This module renders impact reports and opportunity listings. Values
//! with no underlying data show as "n/a" in Markdown and `null` in JSON.

use crate::analysis::largest_changes;
use crate::models::{
    AnalysisRow, ChangeSummary, HostEntity, OpportunityReport, OpportunitySummary,
    ReportMetadata, Score, SurveyResponseInfo,
};
use anyhow::Result;
use serde::Serialize;

/// Rendering options for Markdown output.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    /// Decimal places for scores.
    pub precision: usize,
    /// Number of largest changes to highlight.
    pub highlight_count: usize,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            highlight_count: 5,
        }
    }
}

/// Generate a complete Markdown report for several opportunities.
pub fn generate_markdown_report(reports: &[OpportunityReport], options: MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# Impact Report\n\n");

    if reports.is_empty() {
        output.push_str("No opportunities matched.\n\n");
    }

    for report in reports {
        output.push_str(&generate_opportunity_section(report, options));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the section for one opportunity.
fn generate_opportunity_section(report: &OpportunityReport, options: MarkdownOptions) -> String {
    let mut section = String::new();
    let opportunity = &report.opportunity;

    section.push_str(&format!(
        "## {} (#{})\n\n",
        opportunity.name, opportunity.id
    ));

    if !opportunity.location.is_empty() {
        section.push_str(&format!("- **Location:** {}\n", opportunity.location));
    }
    section.push_str(&format!("- **SDG:** {}\n", opportunity.sdg));
    if let Some(ref host) = report.host {
        section.push_str(&generate_host_line(host));
    }
    section.push_str(&generate_metadata_section(&report.metadata));

    section.push_str(&generate_summary_section(&report.summary, options.precision));
    section.push_str(&generate_rows_table(&report.rows, options.precision));
    section.push_str(&generate_highlights_section(&report.rows, options));

    section
}

fn generate_host_line(host: &HostEntity) -> String {
    format!("- **Host:** {} ({})\n", host.lc.name, host.mc.name)
}

/// Generate the metadata lines.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Responses Analyzed:** {}\n",
        metadata.responses_analyzed
    ));
    section.push_str(&format!("- **Questions:** {}\n", metadata.questions));
    section.push('\n');

    section
}

/// Generate the change summary table.
fn generate_summary_section(summary: &ChangeSummary, precision: usize) -> String {
    let mut section = String::new();

    section.push_str("### Summary\n\n");
    section.push_str("| Both | Initial Only | Final Only | Structural | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        summary.both_phases,
        summary.initial_only,
        summary.final_only,
        summary.structural,
        summary.total_questions
    ));

    if !summary.mean_change.is_no_data() {
        section.push_str(&format!(
            "{} of {} questions with a measurable change: {} improved, {} declined, {} unchanged. Mean change: {}.\n\n",
            summary.with_change,
            summary.total_questions,
            summary.improved,
            summary.declined,
            summary.unchanged,
            format_change(summary.mean_change, precision)
        ));
    } else {
        section.push_str("No question has both initial and final data yet.\n\n");
    }

    section
}

/// Generate the per-question results table.
fn generate_rows_table(rows: &[AnalysisRow], precision: usize) -> String {
    let mut section = String::new();

    section.push_str("### Results by Question\n\n");

    if rows.is_empty() {
        section.push_str("No questions in the catalog.\n\n");
        return section;
    }

    section.push_str("| # | Question | Initial n | Initial avg | Final n | Final avg | Change |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|:---:|:---:|\n");

    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            row.id,
            escape_cell(&row.question),
            format_count(row.total_initial_count),
            row.average_initial_score.display(precision),
            format_count(row.total_final_count),
            row.average_final_score.display(precision),
            format_change(row.change, precision)
        ));
    }
    section.push('\n');

    section
}

/// Generate the largest changes list.
fn generate_highlights_section(rows: &[AnalysisRow], options: MarkdownOptions) -> String {
    let top = largest_changes(rows, options.highlight_count);
    if top.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("### Largest Changes\n\n");
    for (i, row) in top.iter().enumerate() {
        section.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            row.question,
            format_change(row.change, options.precision)
        ));
    }
    section.push('\n');

    section
}

/// Generate a Markdown table of opportunities.
pub fn generate_markdown_listing(listing: &[OpportunitySummary]) -> String {
    let mut output = String::new();

    output.push_str("# Opportunities\n\n");
    if listing.is_empty() {
        output.push_str("No opportunities matched.\n");
        return output;
    }

    output.push_str("| ID | Name | Project | SDG | Responses |\n");
    output.push_str("|:---|:---|:---:|:---:|:---:|\n");
    for item in listing {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            item.id,
            escape_cell(&item.name),
            item.project.id,
            item.project.sdg,
            item.responses_count
        ));
    }

    output
}

/// Generate a Markdown table of response bundles.
pub fn generate_markdown_responses(opportunity_id: u64, responses: &[SurveyResponseInfo]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Responses for Opportunity #{}\n\n", opportunity_id));
    if responses.is_empty() {
        output.push_str("No responses recorded.\n");
        return output;
    }

    output.push_str("| Application | Slot | Updated |\n");
    output.push_str("|:---|:---|:---|\n");
    for response in responses {
        let updated = response
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "| {} | {} | {} |\n",
            response.application_id,
            escape_cell(&response.slot_name),
            updated
        ));
    }

    output
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by impactscore*\n".to_string()
}

/// Serialize any report value as pretty JSON.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

fn format_count(count: Option<u64>) -> String {
    count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_change(change: Score, precision: usize) -> String {
    match change.value() {
        Some(v) if v > 0.0 => format!("+{:.*}", precision, v),
        _ => change.display(precision),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
