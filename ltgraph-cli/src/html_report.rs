//! Standalone HTML report.
//!
//! Tables are rendered server-side; charts are left to `loadtest.js`, which picks up the
//! JSON embedded in `data-ltdata` / `data-errdata` attributes of `div.loadtest-graph`.

use anyhow::Result;
use ltgraph_core::{Analysis, BreakingPoint, MaxPerformance, ProfileReport, Series};
use serde_json::{json, Value};
use std::fmt::Write;

const ASSETS_CSS: &[&str] = &["c3.css"];
const ASSETS_JS: &[&str] = &["d3.v5.min.js", "c3.min.js", "jquery.min.js", "loadtest.js"];

const STYLE: &str = r#"    <style>
      .loadtest-graph { margin: 2em 0; }
      .ft line { stroke: #a00; fill: #a00; }
      .ft text { stroke: #a00 }
      table { border: 2px solid black; border-collapse: collapse; margin: 1em 0; }
      table th { border: 1px solid #aaa; padding: 0.2em 0.5em; }
      table th:not([colspan]) { border-bottom: 2px solid black; }
      table td { text-align: right; border: 1px solid #aaa; padding: 0.2em 0.5em; }
      table td.left { text-align: left; }
    </style>
"#;

/// Join an asset file name onto the configured prefix.
pub fn asset_url(prefix: &str, file: &str) -> String {
    if prefix.is_empty() {
        file.to_string()
    } else if prefix.ends_with('/') {
        format!("{prefix}{file}")
    } else {
        format!("{prefix}/{file}")
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the whole report page.
pub fn render_html(analysis: &Analysis, asset_prefix: &str) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "  <head>")?;
    writeln!(out, "    <meta charset=\"UTF-8\">")?;
    for css in ASSETS_CSS {
        writeln!(
            out,
            "    <link href=\"{}\" rel=\"stylesheet\">",
            html_escape(&asset_url(asset_prefix, css))
        )?;
    }
    for js in ASSETS_JS {
        writeln!(
            out,
            "    <script src=\"{}\" charset=\"utf-8\"></script>",
            html_escape(&asset_url(asset_prefix, js))
        )?;
    }
    out.push_str(STYLE);
    writeln!(out, "    <title>Loadtest results</title>")?;
    writeln!(out, "  </head>")?;
    writeln!(out, "  <body>")?;
    writeln!(out, "    <h1>Loadtest results</h1>")?;

    if !analysis.warnings.is_empty() {
        writeln!(out, "    <h2>Generator warnings</h2>")?;
        writeln!(out, "    <ul>")?;
        for warning in analysis.warning_messages() {
            writeln!(out, "      <li>{}</li>", html_escape(&warning))?;
        }
        writeln!(out, "    </ul>")?;
    }

    writeln!(out, "    <h2>Config</h2>")?;
    writeln!(out, "    <table class=\"config-table\">")?;
    writeln!(out, "      <tr>\n        <th>key</th>\n        <th>value</th>\n      </tr>")?;
    for (key, value) in &analysis.config_keys {
        writeln!(
            out,
            "      <tr>\n        <td class=\"left\">{}</td>\n        <td>{}</td>\n      </tr>",
            html_escape(key),
            html_escape(value)
        )?;
    }
    writeln!(out, "    </table>")?;

    for profile in &analysis.profiles {
        render_profile(&mut out, profile)?;
    }

    writeln!(out, "  </body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

fn render_profile(out: &mut String, profile: &ProfileReport) -> Result<()> {
    let prefix = html_escape(&profile.yprefix);
    let loss_perc = profile.fail_threshold * 100.0;

    writeln!(out, "    <h2>Profile: {}</h2>", html_escape(&profile.name))?;

    // max performance
    writeln!(out, "    <table class=\"stats-table\">")?;
    writeln!(out, "    <caption>Performance max</caption>")?;
    writeln!(out, "    <tr>")?;
    writeln!(out, "      <th rowspan=\"2\">Test name</th>")?;
    writeln!(out, "      <th colspan=\"3\">Channel 0→1</th>")?;
    writeln!(out, "      <th colspan=\"3\">Channel 1→0</th>")?;
    writeln!(out, "    </tr>")?;
    writeln!(out, "    <tr>")?;
    for _ in 0..2 {
        writeln!(out, "      <th>{prefix}pps at &lt;{loss_perc:.2}% loss</th>")?;
        writeln!(out, "      <th>{prefix}pps</th>")?;
        writeln!(out, "      <th>%LR</th>")?;
    }
    writeln!(out, "    </tr>")?;
    for run in &profile.runs {
        writeln!(out, "    <tr>")?;
        writeln!(out, "      <td class=\"left\">{}</td>", html_escape(&run.name))?;
        for mp in &run.max_performance {
            write_max_performance(out, mp)?;
        }
        writeln!(out, "    </tr>")?;
    }
    writeln!(out, "    </table>")?;

    // overload point
    writeln!(out, "    <table class=\"overload-table\">")?;
    writeln!(out, "    <caption>Overload point (loss &gt;{loss_perc:.2}% until the end of the test)</caption>")?;
    writeln!(out, "    <tr>")?;
    writeln!(out, "      <th rowspan=\"2\">Test name</th>")?;
    writeln!(out, "      <th colspan=\"4\">Channel 0→1</th>")?;
    writeln!(out, "      <th colspan=\"4\">Channel 1→0</th>")?;
    writeln!(out, "    </tr>")?;
    writeln!(out, "    <tr>")?;
    for _ in 0..2 {
        writeln!(out, "      <th>datapoint</th>")?;
        writeln!(out, "      <th>tx {prefix}pps</th>")?;
        writeln!(out, "      <th>rx {prefix}pps</th>")?;
        writeln!(out, "      <th>%LR</th>")?;
    }
    writeln!(out, "    </tr>")?;
    for run in &profile.runs {
        writeln!(out, "    <tr>")?;
        writeln!(out, "      <td class=\"left\">{}</td>", html_escape(&run.name))?;
        for bp in &run.breaking_point {
            write_breaking_point(out, bp.as_ref())?;
        }
        writeln!(out, "    </tr>")?;
    }
    writeln!(out, "    </table>")?;

    let ltdata = graph_data(profile, &profile.throughput_series, None);
    let errdata = graph_data(profile, &profile.error_series, Some(profile.fail_threshold));
    writeln!(
        out,
        "    <div class=\"loadtest-graph\" data-ltdata=\"{}\"></div>",
        html_escape(&serde_json::to_string(&ltdata)?)
    )?;
    writeln!(out, "    <details><summary>Error graph (click to show)</summary>")?;
    writeln!(
        out,
        "    <div class=\"loadtest-graph\" data-errdata=\"{}\"></div>",
        html_escape(&serde_json::to_string(&errdata)?)
    )?;
    writeln!(out, "    </details>")?;
    Ok(())
}

fn write_max_performance(out: &mut String, mp: &MaxPerformance) -> Result<()> {
    writeln!(out, "      <td>{:.3}</td>", mp.max_ok_pps)?;
    writeln!(out, "      <td>{:.3}</td>", mp.max_pps)?;
    writeln!(out, "      <td>{:.2}%</td>", mp.max_lr_perc)?;
    Ok(())
}

fn write_breaking_point(out: &mut String, bp: Option<&BreakingPoint>) -> Result<()> {
    match bp {
        Some(bp) => {
            writeln!(out, "      <td>{}</td>", bp.index)?;
            writeln!(out, "      <td>{:.3}</td>", bp.tx_pps)?;
            writeln!(out, "      <td>{:.3}</td>", bp.rx_pps)?;
            writeln!(out, "      <td>{:.2}%</td>", bp.util)?;
        }
        None => writeln!(out, "      <td colspan=\"4\">-</td>")?,
    }
    Ok(())
}

/// Chart payload in c3 column form: each series becomes `[label, v0, v1, ...]`.
pub fn graph_data(profile: &ProfileReport, series: &[Series], fail_threshold: Option<f64>) -> Value {
    let columns: Vec<Value> = series
        .iter()
        .map(|s| {
            let mut column = Vec::with_capacity(s.values.len() + 1);
            column.push(Value::from(s.label.clone()));
            column.extend(s.values.iter().map(|&v| Value::from(v)));
            Value::Array(column)
        })
        .collect();

    let mut data = json!({
        "max": profile.max,
        "yprefix": profile.yprefix,
        "ticks": profile.ticks,
        "data": columns,
    });
    if let (Some(ft), Some(obj)) = (fail_threshold, data.as_object_mut()) {
        obj.insert("ft".to_string(), Value::from(ft));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_prefix_joining() {
        assert_eq!(asset_url("", "c3.css"), "c3.css");
        assert_eq!(asset_url("/static/", "c3.css"), "/static/c3.css");
        assert_eq!(asset_url("https://cdn.example", "c3.css"), "https://cdn.example/c3.css");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }
}
