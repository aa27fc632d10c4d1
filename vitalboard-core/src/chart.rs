//! Chart plumbing shared by the figure builders
//!
//! Figures are `plotly::Plot`s. This module holds the dashboard's base
//! layout, the dashed mean-line decorations, JSON helpers, and the gauge
//! `indicator` trace, which plotly-rs has no type for.

use plotly::common::{DashType, Font};
use plotly::layout::{Annotation, Layout, Margin, Shape, ShapeLine, ShapeType};
use plotly::{Plot, Trace};
use serde::Serialize;
use serde_json::Value;

/// A complete chart: traces plus layout
pub type Figure = Plot;

/// Background shown through heatmap cells that have no data
pub const NO_DATA_COLOR: &str = "#f4f4f4";

/// Margins used by every full-size chart
pub fn default_margin() -> Margin {
    Margin::new().left(40).right(20).top(40).bottom(40)
}

/// White background, black text, default margins
pub fn base_layout(height: u32) -> Layout {
    Layout::new()
        .height(height as usize)
        .margin(default_margin())
        .paper_background_color("white")
        .plot_background_color("white")
        .font(Font::new().color("black"))
}

/// Collect traces and a layout into a figure
pub fn figure(traces: Vec<Box<dyn Trace>>, layout: Layout) -> Figure {
    let mut plot = Plot::new();
    for trace in traces {
        plot.add_trace(trace);
    }
    plot.set_layout(layout);
    plot
}

/// Dashed horizontal line across the plot area at `y`
pub fn mean_line(y: f64, color: &'static str) -> Shape {
    Shape::new()
        .shape_type(ShapeType::Line)
        .x_ref("paper")
        .y_ref("y")
        .x0(0.0)
        .x1(1.0)
        .y0(y)
        .y1(y)
        .line(ShapeLine::new().color(color).width(2.0).dash(DashType::Dash))
}

/// "(平均) 80.0" label just right of the plot area
pub fn mean_label(y: f64, color: &'static str) -> Annotation {
    Annotation::new()
        .x_ref("paper")
        .y_ref("y")
        .x(1.02)
        .y(y)
        .text(&format!("(平均) {:.1}", y))
        .show_arrow(false)
        .font(Font::new().color(color))
}

/// The figure as a JSON value
pub fn to_value(figure: &Figure) -> Value {
    serde_json::from_str(&figure.to_json()).unwrap_or(Value::Null)
}

/// Indented JSON, for printing a single chart
pub fn to_json_pretty(figure: &Figure) -> String {
    serde_json::to_string_pretty(&to_value(figure)).unwrap_or_else(|_| figure.to_json())
}

// ---------------------------------------------------------------------------
// Gauge indicator
// ---------------------------------------------------------------------------

/// Gauge dial trace (`type: "indicator"`)
#[derive(Debug, Clone, Serialize)]
pub struct Indicator {
    r#type: &'static str,
    pub mode: &'static str,
    pub value: f64,
    pub gauge: Gauge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<NumberFormat>,
}

impl Indicator {
    pub fn gauge(value: f64, gauge: Gauge) -> Box<Self> {
        Box::new(Indicator {
            r#type: "indicator",
            mode: "gauge+number",
            value,
            gauge,
            number: None,
        })
    }

    pub fn suffix(mut self: Box<Self>, suffix: &str) -> Box<Self> {
        self.number = Some(NumberFormat {
            suffix: suffix.to_string(),
        });
        self
    }
}

impl Trace for Indicator {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Gauge {
    pub axis: GaugeAxis,
    pub bar: GaugeBar,
    pub steps: Vec<GaugeStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GaugeAxis {
    pub range: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct GaugeBar {
    pub color: String,
}

/// A shaded band of the dial
#[derive(Debug, Clone, Serialize)]
pub struct GaugeStep {
    pub range: [f64; 2],
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberFormat {
    pub suffix: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotly::Scatter;

    fn dial() -> Gauge {
        Gauge {
            axis: GaugeAxis { range: [0.0, 150.0] },
            bar: GaugeBar {
                color: "#EC8177".to_string(),
            },
            steps: vec![GaugeStep {
                range: [60.0, 100.0],
                color: "#CBF7C4".to_string(),
            }],
        }
    }

    #[test]
    fn test_base_layout_sets_house_style() {
        let value = to_value(&figure(Vec::new(), base_layout(350)));
        assert_eq!(value["layout"]["height"], 350);
        assert_eq!(value["layout"]["margin"]["l"], 40);
        assert_eq!(value["layout"]["margin"]["r"], 20);
        assert_eq!(value["layout"]["plot_bgcolor"], "white");
        assert_eq!(value["layout"]["font"]["color"], "black");
    }

    #[test]
    fn test_mean_line_spans_paper_width() {
        let layout = base_layout(350)
            .shapes(vec![mean_line(80.0, "orange")])
            .annotations(vec![mean_label(80.0, "orange")]);
        let value = to_value(&figure(Vec::new(), layout));
        let shape = &value["layout"]["shapes"][0];
        assert_eq!(shape["type"], "line");
        assert_eq!(shape["xref"], "paper");
        assert_eq!(shape["y0"], 80.0);
        assert_eq!(shape["line"]["dash"], "dash");
        assert_eq!(value["layout"]["annotations"][0]["text"], "(平均) 80.0");
    }

    #[test]
    fn test_indicator_serializes_as_gauge_trace() {
        let traces: Vec<Box<dyn Trace>> = vec![Indicator::gauge(72.0, dial()).suffix(" bpm")];
        let value = to_value(&figure(traces, base_layout(250)));
        let trace = &value["data"][0];
        assert_eq!(trace["type"], "indicator");
        assert_eq!(trace["mode"], "gauge+number");
        assert_eq!(trace["value"], 72.0);
        assert_eq!(trace["gauge"]["axis"]["range"][1], 150.0);
        assert_eq!(trace["number"]["suffix"], " bpm");
    }

    #[test]
    fn test_pretty_json_round_trips() {
        let plot = figure(
            vec![Scatter::new(vec![0, 1], vec![70.0, 80.0])],
            base_layout(350),
        );
        let pretty = to_json_pretty(&plot);
        assert!(pretty.contains('\n'));
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(reparsed, to_value(&plot));
        assert_eq!(reparsed["data"][0]["type"], "scatter");
    }
}
