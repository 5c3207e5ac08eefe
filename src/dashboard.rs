//! ==============================================================================
//! dashboard.rs - page composition
//! ==============================================================================
//!
//! purpose:
//!     runs the fetch → normalize → render pipeline for one page request.
//!     collecting and rendering are split so the html is a pure function of
//!     the collected `Page`:
//!
//!         collect(&fetcher)  ──▶  Page  ──▶  render_page(&page)  ──▶  html
//!         (4 sequential GETs)               (no io)
//!
//!     each section carries its own Result. a failed section becomes an
//!     inline notice and never stops the others from rendering.
//!
//! relationships:
//!     - used by: main.rs (page and snapshot handlers)
//!     - uses: fetcher.rs, render.rs, series.rs, error.rs
//!
//! ==============================================================================

use serde::Serialize;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::error::{FetchError, ViewError};
use crate::fetcher::{DataFetcher, Endpoint};
use crate::render::{html_escape, render_view};
use crate::series::Series;

pub const PAGE_TITLE: &str = "Temperature Monitor";

/// one chart+table section of the page
#[derive(Debug, PartialEq, Eq)]
pub struct View {
    pub endpoint: Endpoint,
    pub heading: &'static str,
    pub chart_title: &'static str,
}

pub static VIEWS: [View; 3] = [
    View {
        endpoint: Endpoint::AllReadings,
        heading: "All Readings",
        chart_title: "Temperature over time",
    },
    View {
        endpoint: Endpoint::HourlyAverage,
        heading: "Hourly Average",
        chart_title: "Hourly Average Temperature",
    },
    View {
        endpoint: Endpoint::DailyAverage,
        heading: "Daily Average",
        chart_title: "Daily Average Temperature",
    },
];

pub struct ViewOutcome {
    pub view: &'static View,
    pub series: Result<Series, ViewError>,
}

/// everything one render needs
pub struct Page {
    pub current: Result<String, FetchError>,
    pub views: Vec<ViewOutcome>,
}

/// fetch every section, strictly one after another
pub async fn collect(fetcher: &DataFetcher) -> Page {
    let current = fetcher.fetch_current().await;

    let mut views = Vec::with_capacity(VIEWS.len());
    for view in &VIEWS {
        let series = fetcher.fetch_series(view.endpoint).await;
        views.push(ViewOutcome { view, series });
    }

    let failed = views.iter().filter(|v| v.series.is_err()).count() + usize::from(current.is_err());
    let empty = views
        .iter()
        .filter(|v| v.series.as_ref().is_ok_and(Series::is_empty))
        .count();
    debug!(sections = views.len() + 1, failed, empty, "page data collected");

    Page { current, views }
}

// ==============================================================================
// html
// ==============================================================================

pub fn render_page(page: &Page, config: &DashboardConfig) -> String {
    let refresh = if config.refresh_seconds > 0 {
        format!(r#"<meta http-equiv="refresh" content="{}">"#, config.refresh_seconds)
    } else {
        String::new()
    };

    let mut body = format!("<h1>{PAGE_TITLE}</h1>");
    body.push_str(&render_metric(&page.current));
    for outcome in &page.views {
        body.push_str(&render_section(outcome));
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}<title>{PAGE_TITLE}</title>
<style>{STYLE}</style>
</head>
<body>
<main>{body}</main>
</body>
</html>
"#
    )
}

fn render_metric(current: &Result<String, FetchError>) -> String {
    match current {
        Ok(value) => {
            let shown = if value.is_empty() {
                "-".to_string()
            } else {
                format!("{} °C", html_escape(value))
            };
            format!(
                r#"<section class="metric"><div class="metric-label">Current Temperature</div><div class="metric-value">{shown}</div></section>"#
            )
        }
        Err(e) => notice(&e.to_string()),
    }
}

fn render_section(outcome: &ViewOutcome) -> String {
    let content = match &outcome.series {
        Ok(series) => render_view(series, outcome.view.chart_title),
        Err(e) => notice(&e.to_string()),
    };
    format!(
        r#"<section class="view-section" id="{id}"><h2>{heading}</h2>{content}</section>"#,
        id = outcome.view.endpoint.path().trim_start_matches('/'),
        heading = outcome.view.heading,
    )
}

fn notice(message: &str) -> String {
    format!(r#"<div class="notice error">{}</div>"#, html_escape(message))
}

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; margin: 0; background: #1a1a2e; color: #eee; }\
main { padding: 1.5rem 2rem; }\
h1 { margin-top: 0; }\
.metric { background: #16213e; border-radius: 8px; padding: 1rem; display: inline-block; min-width: 12rem; }\
.metric-label { color: #888; font-size: 0.9rem; }\
.metric-value { font-size: 2.2rem; }\
.view { display: flex; gap: 1rem; align-items: flex-start; }\
.chart { flex: 0 0 80%; }\
.readings { flex: 0 0 20%; max-height: 22rem; overflow-y: auto; }\
.line-chart { width: 100%; height: auto; background: #16213e; border-radius: 8px; }\
.line-chart .axis { stroke: #888; }\
.line-chart .series { fill: none; stroke: #4cc9f0; stroke-width: 2; }\
.line-chart .point { fill: #4cc9f0; }\
.line-chart text { fill: #ccc; font-size: 12px; }\
.line-chart .chart-title { font-size: 16px; }\
.readings-table { border-collapse: collapse; width: 100%; font-size: 0.85rem; }\
.readings-table th, .readings-table td { padding: 0.2rem 0.5rem; border-bottom: 1px solid #333; text-align: left; }\
.notice.error { background: #3b1f2b; color: #ff6b6b; padding: 0.75rem 1rem; border-radius: 8px; }\
";

// ==============================================================================
// json snapshot
// ==============================================================================

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome<T> {
    Ok(T),
    Error(String),
}

impl<T, E: std::fmt::Display> From<&Result<T, E>> for Outcome<T>
where
    T: Clone,
{
    fn from(result: &Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value.clone()),
            Err(e) => Outcome::Error(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct SnapshotView {
    endpoint: &'static str,
    heading: &'static str,
    #[serde(flatten)]
    outcome: Outcome<Series>,
}

#[derive(Serialize)]
pub struct Snapshot {
    current: Outcome<String>,
    views: Vec<SnapshotView>,
}

impl Page {
    /// the same data as the html page, for programmatic access
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current: Outcome::from(&self.current),
            views: self
                .views
                .iter()
                .map(|outcome| SnapshotView {
                    endpoint: outcome.view.endpoint.path(),
                    heading: outcome.view.heading,
                    outcome: Outcome::from(&outcome.series),
                })
                .collect(),
        }
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::{http::StatusCode, routing::get};
    use serde_json::json;

    #[tokio::test]
    async fn test_healthy_page_shows_everything() {
        let base = testing::serve(testing::healthy_upstream()).await;
        let page = collect(&testing::fetcher(&base)).await;
        let html = render_page(&page, &DashboardConfig::default());

        assert!(html.contains("<h1>Temperature Monitor</h1>"));
        assert!(html.contains("21.5 °C"));
        for view in &VIEWS {
            assert!(html.contains(&format!("<h2>{}</h2>", view.heading)));
            assert!(html.contains(view.chart_title));
        }
        assert!(!html.contains("notice error"));
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[tokio::test]
    async fn test_failed_view_is_skipped_others_render() {
        let base = testing::serve(testing::upstream_with_hourly(
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database locked") }),
        ))
        .await;
        let page = collect(&testing::fetcher(&base)).await;

        assert!(page.current.is_ok());
        assert!(page.views[0].series.is_ok());
        assert!(matches!(page.views[1].series, Err(ViewError::Fetch(FetchError::Status { .. }))));
        assert!(page.views[2].series.is_ok());

        let html = render_page(&page, &DashboardConfig::default());
        assert!(html.contains("Error fetching data from /hourly_average"));
        assert!(!html.contains("Hourly Average Temperature"));
        assert!(html.contains("Temperature over time"));
        assert!(html.contains("Daily Average Temperature"));
        assert!(html.contains("21.5 °C"));
        assert_eq!(html.matches("<svg").count(), 2);
    }

    #[tokio::test]
    async fn test_one_request_per_endpoint_in_order() {
        let (router, requests) = testing::recording(testing::upstream_with_hourly(get(|| async {
            StatusCode::INTERNAL_SERVER_ERROR
        })));
        let base = testing::serve(router).await;

        let page = collect(&testing::fetcher(&base)).await;
        assert!(page.views[1].series.is_err());

        assert_eq!(
            *requests.lock().unwrap(),
            ["/current", "/all_readings", "/hourly_average", "/daily_average"]
        );
    }

    #[tokio::test]
    async fn test_bare_string_payload_is_inline_schema_notice() {
        let base = testing::serve(testing::upstream_with_hourly(get(|| async {
            axum::Json(json!("no readings yet"))
        })))
        .await;
        let page = collect(&testing::fetcher(&base)).await;

        assert!(matches!(page.views[1].series, Err(ViewError::Schema { .. })));
        let html = render_page(&page, &DashboardConfig::default());
        assert!(html.contains(
            "Invalid data from /hourly_average: expected an array of readings, found a string"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_still_renders_page() {
        let base = testing::unreachable_base_url().await;
        let page = collect(&testing::fetcher(&base)).await;

        assert!(page.current.is_err());
        assert!(page.views.iter().all(|v| v.series.is_err()));

        let html = render_page(&page, &DashboardConfig::default());
        assert!(html.contains("<h1>Temperature Monitor</h1>"));
        assert_eq!(html.matches("notice error").count(), 4);
        assert!(html.contains("Error fetching data from /current"));
    }

    #[test]
    fn test_empty_current_shows_dash() {
        let page = Page {
            current: Ok(String::new()),
            views: Vec::new(),
        };
        let html = render_page(&page, &DashboardConfig::default());
        assert!(html.contains(r#"<div class="metric-value">-</div>"#));
    }

    #[test]
    fn test_empty_series_renders_without_notice() {
        let page = Page {
            current: Ok("19.0".to_string()),
            views: VIEWS
                .iter()
                .map(|view| ViewOutcome { view, series: Ok(Series::default()) })
                .collect(),
        };
        let html = render_page(&page, &DashboardConfig::default());
        assert_eq!(html.matches("<svg").count(), 3);
        assert!(!html.contains("notice error"));
    }

    #[test]
    fn test_refresh_meta() {
        let page = Page { current: Ok("20".to_string()), views: Vec::new() };
        let html = render_page(&page, &DashboardConfig { refresh_seconds: 15 });
        assert!(html.contains(r#"<meta http-equiv="refresh" content="15">"#));
    }

    #[test]
    fn test_render_page_is_idempotent() {
        let page = Page {
            current: Ok("21.5".to_string()),
            views: VIEWS
                .iter()
                .map(|view| ViewOutcome { view, series: Ok(testing::two_readings()) })
                .collect(),
        };
        let config = DashboardConfig::default();
        assert_eq!(render_page(&page, &config), render_page(&page, &config));
    }

    #[tokio::test]
    async fn test_snapshot_shape() {
        let base = testing::serve(testing::upstream_with_hourly(
            get(|| async { StatusCode::NOT_FOUND }),
        ))
        .await;
        let page = collect(&testing::fetcher(&base)).await;
        let snapshot = serde_json::to_value(page.snapshot()).unwrap();

        assert_eq!(snapshot["current"], json!({"ok": "21.5"}));
        assert_eq!(snapshot["views"][0]["endpoint"], "/all_readings");
        assert_eq!(
            snapshot["views"][0]["ok"],
            json!([
                {"time": "2024-01-01T00:00:00", "value": 20.1},
                {"time": "2024-01-01T01:00:00", "value": 20.5}
            ])
        );
        assert_eq!(
            snapshot["views"][1]["error"],
            "Error fetching data from /hourly_average: HTTP 404 Not Found"
        );
        assert!(snapshot["views"][2]["ok"].is_array());
    }
}
