//! ==============================================================================
//! render.rs - chart and table rendering for one view
//! ==============================================================================
//!
//! purpose:
//!     draws a series as an inline svg line chart next to a plain html table.
//!     everything here is a pure function of its input: the same series always
//!     produces the same markup, and an empty series is a valid input.
//!
//! layout:
//!
//!     ┌──────────────────────────────────────────┬───────────┐
//!     │ chart (80%)                              │ table     │
//!     │                                          │ (20%)     │
//!     │   value ▲      ●──●                      │ time value│
//!     │         │  ●──●    ╲●                    │ ...  ...  │
//!     │         └────────────────▶ time          │           │
//!     └──────────────────────────────────────────┴───────────┘
//!
//! relationships:
//!     - used by: dashboard.rs (one call per successful view)
//!     - uses: series.rs (Series, Reading)
//!
//! ==============================================================================

use crate::series::{Series, Timestamp};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

const AXIS_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// chart and table side by side
pub fn render_view(series: &Series, title: &str) -> String {
    format!(
        r#"<div class="view"><div class="chart">{}</div><div class="readings">{}</div></div>"#,
        render_chart(series, title),
        render_table(series)
    )
}

// ==============================================================================
// chart
// ==============================================================================

/// maps readings into svg coordinates
///
/// the series is not sorted, so the time bounds are whichever readings are
/// earliest and latest, not the first and last ones.
struct Scale {
    earliest: Timestamp,
    latest: Timestamp,
    v_min: f64,
    v_max: f64,
}

impl Scale {
    fn fit(series: &Series) -> Option<Self> {
        let first = series.readings().first()?;
        let mut scale = Self {
            earliest: first.timestamp,
            latest: first.timestamp,
            v_min: first.value,
            v_max: first.value,
        };

        for reading in series {
            if reading.timestamp.millis() < scale.earliest.millis() {
                scale.earliest = reading.timestamp;
            }
            if reading.timestamp.millis() > scale.latest.millis() {
                scale.latest = reading.timestamp;
            }
            scale.v_min = scale.v_min.min(reading.value);
            scale.v_max = scale.v_max.max(reading.value);
        }

        Some(scale)
    }

    fn t_span(&self) -> i64 {
        self.latest.millis() - self.earliest.millis()
    }

    fn x(&self, timestamp: &Timestamp) -> f64 {
        let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let span = self.t_span();
        if span == 0 {
            return MARGIN_LEFT + plot_width / 2.0;
        }
        let offset = (timestamp.millis() - self.earliest.millis()) as f64 / span as f64;
        MARGIN_LEFT + offset * plot_width
    }

    fn y(&self, value: f64) -> f64 {
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let span = self.v_max - self.v_min;
        if span == 0.0 {
            return MARGIN_TOP + plot_height / 2.0;
        }
        MARGIN_TOP + (self.v_max - value) / span * plot_height
    }
}

/// line plot of value against time
pub fn render_chart(series: &Series, title: &str) -> String {
    let x_axis_y = HEIGHT - MARGIN_BOTTOM;
    let mut svg = format!(
        r#"<svg class="line-chart" viewBox="0 0 {w} {h}" preserveAspectRatio="xMidYMid meet" role="img" data-points="{n}"><title>{title}</title><text class="chart-title" x="{tx}" y="24" text-anchor="middle">{title}</text><line class="axis" x1="{l}" y1="{t}" x2="{l}" y2="{b}"/><line class="axis" x1="{l}" y1="{b}" x2="{r}" y2="{b}"/>"#,
        w = WIDTH,
        h = HEIGHT,
        n = series.len(),
        title = html_escape(title),
        tx = WIDTH / 2.0,
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = x_axis_y,
        r = WIDTH - MARGIN_RIGHT,
    );

    if let Some(scale) = Scale::fit(series) {
        let points: Vec<(f64, f64)> = series
            .iter()
            .map(|reading| (scale.x(&reading.timestamp), scale.y(reading.value)))
            .collect();

        if points.len() > 1 {
            let path = points
                .iter()
                .map(|(x, y)| format!("{x:.1},{y:.1}"))
                .collect::<Vec<_>>()
                .join(" ");
            svg.push_str(&format!(r#"<polyline class="series" points="{path}"/>"#));
        }

        for (x, y) in &points {
            svg.push_str(&format!(r#"<circle class="point" cx="{x:.1}" cy="{y:.1}" r="3"/>"#));
        }

        svg.push_str(&axis_labels(&scale));
    }

    svg.push_str("</svg>");
    svg
}

fn axis_labels(scale: &Scale) -> String {
    let label_x = MARGIN_LEFT - 8.0;
    let bottom = HEIGHT - MARGIN_BOTTOM;
    let mut labels = format!(
        r#"<text class="tick" x="{label_x}" y="{top:.1}" text-anchor="end">{max}</text><text class="tick" x="{label_x}" y="{bottom:.1}" text-anchor="end">{min}</text>"#,
        top = scale.y(scale.v_max),
        max = scale.v_max,
        min = scale.v_min,
    );

    let time_y = bottom + 20.0;
    if scale.t_span() == 0 {
        labels.push_str(&format!(
            r#"<text class="tick" x="{x:.1}" y="{time_y}" text-anchor="middle">{t}</text>"#,
            x = scale.x(&scale.earliest),
            t = scale.earliest.format_with(AXIS_TIME_FORMAT),
        ));
        return labels;
    }

    labels.push_str(&format!(
        r#"<text class="tick" x="{x:.1}" y="{time_y}" text-anchor="start">{t}</text>"#,
        x = scale.x(&scale.earliest),
        t = scale.earliest.format_with(AXIS_TIME_FORMAT),
    ));
    labels.push_str(&format!(
        r#"<text class="tick" x="{x:.1}" y="{time_y}" text-anchor="end">{t}</text>"#,
        x = scale.x(&scale.latest),
        t = scale.latest.format_with(AXIS_TIME_FORMAT),
    ));
    labels
}

// ==============================================================================
// table
// ==============================================================================

/// every reading, in series order
pub fn render_table(series: &Series) -> String {
    let mut html = String::from(
        r#"<table class="readings-table"><thead><tr><th>time</th><th>value</th></tr></thead><tbody>"#,
    );
    for reading in series {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            reading.timestamp,
            reading.value
        ));
    }
    html.push_str("</tbody></table>");
    html
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
