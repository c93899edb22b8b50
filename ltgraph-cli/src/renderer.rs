use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};
use console::style;
use ltgraph_core::{Analysis, BreakingPoint, MaxPerformance, ProfileReport};

use crate::html_report::render_html;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Standalone HTML page with tables and chart data
    Html,
    /// The full analysis as JSON
    Json,
    /// Terminal tables
    Table,
}

impl OutputFormat {
    /// Where output goes when `--output` is not given.
    pub fn default_output(&self) -> &'static str {
        match self {
            OutputFormat::Html => "index.html",
            OutputFormat::Json | OutputFormat::Table => "-",
        }
    }
}

/// Render the analysis in the requested format.
pub fn render(analysis: &Analysis, format: OutputFormat, asset_prefix: &str) -> Result<String> {
    match format {
        OutputFormat::Html => render_html(analysis, asset_prefix),
        OutputFormat::Json => render_json(analysis),
        OutputFormat::Table => Ok(render_tables(analysis)),
    }
}

pub fn render_json(analysis: &Analysis) -> Result<String> {
    let mut json = serde_json::to_string_pretty(analysis)?;
    json.push('\n');
    Ok(json)
}

/// Terminal rendering: warnings, config and per-profile summary tables.
pub fn render_tables(analysis: &Analysis) -> String {
    let mut out = String::new();

    if !analysis.warnings.is_empty() {
        out.push_str(&format!("{}\n", style("Generator warnings:").bold().yellow()));
        for warning in analysis.warning_messages() {
            out.push_str(&format!("  {} {}\n", style("W:").yellow(), warning));
        }
        out.push('\n');
    }

    let mut config = new_table();
    config.set_header(vec!["key", "value"]);
    for (key, value) in &analysis.config_keys {
        config.add_row(vec![key.as_str(), value.as_str()]);
    }
    out.push_str(&format!("{}\n{}\n", style("Config").bold(), config));

    for profile in &analysis.profiles {
        out.push_str(&format!(
            "\n{}\n",
            style(format!("Profile: {}", profile.name)).bold().cyan()
        ));
        out.push_str(&format!("{}\n", max_performance_table(profile)));
        out.push_str(&format!("{}\n", overload_table(profile)));
    }
    out
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn max_performance_table(profile: &ProfileReport) -> Table {
    let prefix = &profile.yprefix;
    let ok_header = format!("{prefix}pps at <{:.2}% loss", profile.fail_threshold * 100.0);

    let mut table = new_table();
    let mut header = vec![Cell::new("Test name")];
    for dir in ["0→1", "1→0"] {
        header.push(Cell::new(format!("{dir} {ok_header}")));
        header.push(Cell::new(format!("{dir} {prefix}pps")));
        header.push(Cell::new(format!("{dir} %LR")));
    }
    table.set_header(header);

    for run in &profile.runs {
        let mut row = vec![Cell::new(&run.name)];
        for mp in &run.max_performance {
            row.extend(max_performance_cells(mp));
        }
        table.add_row(row);
    }
    table
}

fn max_performance_cells(mp: &MaxPerformance) -> [Cell; 3] {
    [
        Cell::new(format!("{:.3}", mp.max_ok_pps)).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.3}", mp.max_pps)).set_alignment(CellAlignment::Right),
        Cell::new(format!("{:.2}%", mp.max_lr_perc)).set_alignment(CellAlignment::Right),
    ]
}

fn overload_table(profile: &ProfileReport) -> Table {
    let prefix = &profile.yprefix;
    let mut table = new_table();
    let mut header = vec![Cell::new("Overload point")];
    for dir in ["0→1", "1→0"] {
        header.push(Cell::new(format!("{dir} datapoint")));
        header.push(Cell::new(format!("{dir} tx {prefix}pps")));
        header.push(Cell::new(format!("{dir} rx {prefix}pps")));
        header.push(Cell::new(format!("{dir} %LR")));
    }
    table.set_header(header);

    for run in &profile.runs {
        let mut row = vec![Cell::new(&run.name)];
        for bp in &run.breaking_point {
            row.extend(breaking_point_cells(bp.as_ref()));
        }
        table.add_row(row);
    }
    table
}

fn breaking_point_cells(bp: Option<&BreakingPoint>) -> [Cell; 4] {
    match bp {
        Some(bp) => [
            Cell::new(bp.index).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", bp.tx_pps)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", bp.rx_pps)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", bp.util)).set_alignment(CellAlignment::Right),
        ],
        None => [Cell::new("-"), Cell::new("-"), Cell::new("-"), Cell::new("-")],
    }
}
