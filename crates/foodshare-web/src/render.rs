//! HTML building blocks shared by every page.

use std::fmt::Write as _;

use axum::response::Html;
use foodshare_warehouse::{display_value, Presentation, QueryResult, ReportOutput};

const CSS: &str = r"
*{margin:0;padding:0;box-sizing:border-box}
body{background:#f6f8f5;color:#1f2a1f;font-family:'Segoe UI',system-ui,sans-serif}
a{color:#2f7d32;text-decoration:none}a:hover{text-decoration:underline}
.nav{background:#2f7d32;padding:0.75rem 2rem;display:flex;align-items:center;gap:2rem}
.nav h1{font-size:1.2rem;color:#fff}.nav a{color:#e3f1e3}.nav a:hover{color:#fff}
.container{max-width:1200px;margin:0 auto;padding:1.5rem}
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(480px,1fr));gap:1.25rem}
.card{background:#fff;border:1px solid #d7e2d5;border-radius:8px;padding:1.25rem;overflow-x:auto}
.card h3{margin-bottom:0.75rem;font-size:1.05rem}
.metric{font-size:2.2rem;font-weight:700;color:#2f7d32}
table{width:100%;border-collapse:collapse;font-size:0.9rem}th,td{padding:0.5rem;text-align:left;border-bottom:1px solid #e6ede4}
th{color:#5b6b5a;font-weight:600}
.bar-row{display:flex;align-items:center;gap:0.5rem;margin:0.25rem 0;font-size:0.85rem}
.bar-label{width:35%;overflow:hidden;text-overflow:ellipsis;white-space:nowrap}
.bar{background:#66bb6a;height:1rem;border-radius:3px}
.empty{color:#7a8a79;font-style:italic}
.notice{background:#e3f4e4;border:1px solid #66bb6a;color:#1b5e20;padding:0.75rem;border-radius:6px;margin-bottom:1rem}
.error{background:#fdecea;border:1px solid #e57373;color:#b71c1c;padding:0.75rem;border-radius:6px;margin-bottom:1rem;white-space:pre-wrap}
form.inline{display:flex;gap:0.75rem;flex-wrap:wrap;align-items:flex-end;margin-bottom:1.25rem}
.form-group{margin-bottom:0.75rem}
.form-group label{display:block;color:#5b6b5a;font-size:0.85rem;margin-bottom:0.25rem}
input,select,textarea{background:#fff;border:1px solid #c4d3c2;border-radius:6px;padding:0.45rem;font-size:0.9rem}
textarea{width:100%;font-family:monospace}
.btn{background:#2f7d32;color:#fff;border:none;padding:0.5rem 1rem;border-radius:6px;cursor:pointer;font-size:0.9rem}
.btn-danger{background:#c62828}
.tabs{display:flex;gap:1rem;margin-bottom:1.25rem}
.tabs a.active{font-weight:700;text-decoration:underline}
";

fn nav_html() -> &'static str {
    r#"<nav class="nav"><h1>Local Food Wastage Management</h1>
    <a href="/">Dashboard</a><a href="/find">Find Food</a><a href="/manage">Manage Listings</a><a href="/query">Run SQL</a></nav>"#
}

/// Full HTML document around a page body.
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title} | Food Wastage</title><style>{CSS}</style></head>
<body>{nav}<div class="container"><h2 style="margin-bottom:1rem">{title}</h2>{body}</div></body></html>"#,
        title = escape(title),
        nav = nav_html(),
    ))
}

/// Escape text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn notice(message: &str) -> String {
    format!(r#"<div class="notice">{}</div>"#, escape(message))
}

pub fn error_banner(message: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, escape(message))
}

pub fn empty_state(message: &str) -> String {
    format!(r#"<p class="empty">{}</p>"#, escape(message))
}

/// Result rows as a table, or the "no data" state when nothing matched.
pub fn table(result: &QueryResult) -> String {
    if result.is_empty() {
        return empty_state("No data.");
    }

    let mut html = String::from("<table><thead><tr>");
    for column in &result.columns {
        let _ = write!(html, "<th>{}</th>", escape(&column.name));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &result.rows {
        html.push_str("<tr>");
        for value in row {
            let _ = write!(html, "<td>{}</td>", escape(&display_value(value)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    if result.truncated {
        let _ = write!(
            html,
            r#"<p class="empty">Showing the first {} rows.</p>"#,
            result.row_count
        );
    }
    html
}

/// Horizontal bars scaled to the largest value.
pub fn bar_chart(points: &[(String, f64)]) -> String {
    let max = points
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0_f64, f64::max);
    if points.is_empty() || max <= 0.0 {
        return String::new();
    }

    let mut html = String::from(r#"<div style="margin-top:1rem">"#);
    for (label, value) in points {
        let width = (value / max * 100.0).clamp(0.0, 100.0);
        let _ = write!(
            html,
            r#"<div class="bar-row"><span class="bar-label">{label}</span><span class="bar" style="width:{width:.1}%"></span><span>{value}</span></div>"#,
            label = escape(label),
            value = escape(&format_number(*value)),
        );
    }
    html.push_str("</div>");
    html
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// One dashboard card for a finished report.
pub fn report_card(report: &ReportOutput) -> String {
    let content = match report.presentation {
        Presentation::Metric => format!(
            r#"<div class="metric">{}</div>"#,
            escape(&report.metric_text())
        ),
        Presentation::Table => table(&report.result),
        Presentation::BarChart => {
            let mut content = table(&report.result);
            content.push_str(&bar_chart(&report.chart_points()));
            content
        }
    };
    format!(
        r#"<div class="card" id="{slug}"><h3>{title}</h3>{content}</div>"#,
        slug = report.id.slug(),
        title = escape(report.title),
    )
}

/// `<select>` with the current value pre-selected.
pub fn select<'a>(
    name: &str,
    options: impl IntoIterator<Item = (&'a str, &'a str)>,
    selected: Option<&str>,
) -> String {
    let mut html = format!(r#"<select name="{}" id="{}">"#, escape(name), escape(name));
    for (value, label) in options {
        let marker = if selected == Some(value) { " selected" } else { "" };
        let _ = write!(
            html,
            r#"<option value="{}"{marker}>{}</option>"#,
            escape(value),
            escape(label)
        );
    }
    html.push_str("</select>");
    html
}
