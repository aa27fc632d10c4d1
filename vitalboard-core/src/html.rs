//! HTML page generation
//!
//! Builds self-contained dashboard pages with embedded CSS. Charts are
//! embedded as JSON figure specifications and drawn by plotly.js, which the
//! page loads from the configured URL.

use crate::chart::Figure;
use crate::records::{AnomalyEvent, Severity};
use crate::transform::{highlight_rows, split_hours, Computed};

/// How a change against the previous period is shown under a headline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStyle {
    /// The ratio rounded to two decimals, shown as a percentage
    Percent,
    /// Signed relative change with a direction arrow: red for up, green for down
    Arrow,
}

/// Render a change badge; an undefined value renders as "N/A"
pub fn change_badge(change: Computed, style: ChangeStyle) -> String {
    let Some(value) = change.value() else {
        return r#"<p class="change change-na">N/A</p>"#.to_string();
    };
    match style {
        ChangeStyle::Percent => {
            // the ratio is shown at two decimals, then scaled
            let rounded = (value * 100.0).round() / 100.0;
            format!(r#"<p class="change">{:.2}%</p>"#, rounded * 100.0)
        }
        ChangeStyle::Arrow if value > 0.0 => {
            format!(r#"<p class="change change-up">▲ {:.2}%</p>"#, value * 100.0)
        }
        ChangeStyle::Arrow if value < 0.0 => {
            format!(r#"<p class="change change-down">▼ {:.2}%</p>"#, value.abs() * 100.0)
        }
        ChangeStyle::Arrow => r#"<p class="change change-flat">0.00%</p>"#.to_string(),
    }
}

/// Colored panel title bar
pub fn panel_header(title: &str, color: &str) -> String {
    format!(
        r#"<div class="panel-header" style="background-color: {color};">{title}</div>"#,
        color = html_escape(color),
        title = html_escape(title),
    )
}

/// Centered caption above a headline or chart
pub fn caption(text: &str) -> String {
    format!(r#"<div class="caption">{}</div>"#, html_escape(text))
}

/// Large headline value with an optional unit and pre-rendered badge
pub fn headline(value: &str, unit: &str, badge: Option<&str>) -> String {
    let unit_html = if unit.is_empty() {
        String::new()
    } else {
        format!(r#"<span class="unit"> {}</span>"#, html_escape(unit))
    };
    format!(
        r#"<div class="headline">
    <p class="large-number">{value}{unit}</p>
    {badge}
</div>"#,
        value = html_escape(value),
        unit = unit_html,
        badge = badge.unwrap_or_default(),
    )
}

/// Headline for a duration in fractional hours, shown as hours and minutes
pub fn duration_headline(hours: f64) -> String {
    let (h, m) = split_hours(hours);
    format!(
        r#"<div class="headline">
    <p class="large-number">{h}<span class="unit">時間</span>{m:02}<span class="unit">分</span></p>
</div>"#,
    )
}

/// Boxed list of lines on a tinted background
pub fn record_list(lines: &[String], background: &str) -> String {
    let body = if lines.is_empty() {
        r#"<span class="empty">記録はありません</span>"#.to_string()
    } else {
        lines
            .iter()
            .map(|l| html_escape(l))
            .collect::<Vec<_>>()
            .join("<br>")
    };
    format!(
        r#"<div class="record-container" style="background-color: {bg};"><div class="record">{body}</div></div>"#,
        bg = html_escape(background),
        body = body,
    )
}

/// Anomaly log with every critical row highlighted
pub fn anomaly_table(events: &[AnomalyEvent]) -> String {
    let highlighted = highlight_rows(events, Severity::Critical);
    let rows: String = events
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let class = if highlighted.binary_search(&i).is_ok() {
                r#" class="critical""#
            } else {
                ""
            };
            format!(
                r#"
        <tr{class}>
            <td class="monospace">{time}</td>
            <td>{severity}</td>
            <td>{category}</td>
            <td>{message}</td>
        </tr>"#,
                class = class,
                time = e.timestamp.format("%Y-%m-%d %H:%M"),
                severity = html_escape(&e.severity.label),
                category = html_escape(&e.category),
                message = html_escape(&e.message),
            )
        })
        .collect();

    format!(
        r#"<div class="table-scroll">
<table class="anomaly-log">
    <thead>
        <tr>
            <th>日時</th>
            <th>危険度</th>
            <th>種別</th>
            <th>内容</th>
        </tr>
    </thead>
    <tbody>{rows}
    </tbody>
</table>
</div>"#,
    )
}

/// Chart container plus the script that draws it
pub fn figure_embed(element_id: &str, figure: &Figure) -> String {
    format!(
        r#"<div class="figure" id="{id}"></div>
<script>(function () {{
    var fig = {json};
    Plotly.newPlot("{id}", fig.data, fig.layout, {{displayModeBar: false, responsive: true}});
}})();</script>"#,
        id = html_escape(element_id),
        json = json_for_script(&figure.to_json()),
    )
}

/// Complete HTML document around an already-rendered body
pub fn render_document(title: &str, plotly_js: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
    <script src="{plotly_js}"></script>
</head>
<body>
    <div class="container">
        <header><h1>{title}</h1></header>
        <main class="panels">
{body}
        </main>
        {footer}
    </div>
</body>
</html>"#,
        title = html_escape(title),
        css = inline_css(),
        plotly_js = html_escape(plotly_js),
        body = body,
        footer = render_footer(),
    )
}

fn render_footer() -> String {
    r#"<footer>
    <p>Generated by vitalboard</p>
</footer>"#
        .to_string()
}

/// Format a headline number: integers without a fraction, others to one decimal
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

fn inline_css() -> &'static str {
    r#"
* {
    box-sizing: border-box;
    margin: 0;
    padding: 0;
}

body {
    font-family: system-ui, -apple-system, 'Hiragino Sans', 'Noto Sans JP', sans-serif;
    line-height: 1.6;
    color: #111827;
    background: #DEDEDE;
}

.container {
    max-width: 1600px;
    margin: 0 auto;
    padding: 1.5rem;
}

header h1 {
    font-size: 1.5rem;
    font-weight: 700;
    margin-bottom: 1rem;
}

.panels {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(420px, 1fr));
    gap: 1rem;
}

.panel {
    background: #FAFAFA;
    padding-bottom: 0.75rem;
}

.panel-header {
    text-align: center;
    font-size: 1.75rem;
    font-weight: 700;
    color: #ffffff;
    padding: 0.25rem 0;
}

.row {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
    gap: 0.5rem;
}

.caption {
    text-align: center;
    font-size: 0.9em;
    font-weight: 700;
    margin: 10px 5px;
    background: #ffffff;
}

.headline {
    background: #ffffff;
    border: 1px solid #dddddd;
    text-align: center;
    margin: 0 10px;
    padding: 10px;
}

.large-number {
    font-size: 3em;
    font-weight: 700;
}

.unit {
    font-size: 24px;
    font-weight: 400;
}

.change {
    font-weight: 700;
    color: red;
}

.change-up { color: red; }
.change-down { color: green; }
.change-flat, .change-na { color: #6b7280; }

.record-container {
    margin: 0 10px;
    padding: 10px;
    border-radius: 0.5rem;
}

.record .empty {
    color: #6b7280;
}

.figure {
    margin: 0 10px;
}

.table-scroll {
    max-height: 400px;
    overflow-y: auto;
    margin: 0 10px;
}

table {
    width: 100%;
    border-collapse: collapse;
    background: #ffffff;
}

th {
    padding: 0.5rem;
    text-align: left;
    font-weight: 600;
    font-size: 0.875rem;
    border-bottom: 2px solid #e5e7eb;
}

td {
    padding: 0.5rem;
    border-bottom: 1px solid #e5e7eb;
    font-size: 0.875rem;
}

tr.critical td {
    background: lightcoral;
}

.monospace {
    font-family: ui-monospace, 'SF Mono', Menlo, monospace;
}

footer {
    margin-top: 1.5rem;
    text-align: center;
    color: #6b7280;
    font-size: 0.875rem;
}
"#
}

/// Make serialized JSON safe to place inside a `<script>` element
fn json_for_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
