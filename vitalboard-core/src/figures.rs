//! Figure builders
//!
//! One builder per chart on the dashboard. Each takes already-loaded rows
//! plus the resolved chart settings and returns a plotly `Plot`; none of
//! them touch the filesystem.

use crate::chart::{
    base_layout, figure, mean_label, mean_line, Figure, Gauge, GaugeAxis, GaugeBar, GaugeStep,
    Indicator, NO_DATA_COLOR,
};
use crate::config::{ChartSettings, GaugeSettings};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::records::*;
use crate::store::DataStore;
use crate::transform::{
    count_by_category, five_number, peak_labels, pivot, stack, CategoryScale, Comparison,
    ComparisonOrder, Overlay, PivotGrid, PivotSpec, VitalMetric,
};
use plotly::common::{
    ColorScale, ColorScaleElement, ColorScalePalette, Fill, Font, HoverInfo, Line, Marker, Mode,
    Orientation, Position, TextPosition, TickMode,
};
use plotly::layout::{Axis, AxisType, BarMode, Legend, Margin};
use plotly::{Bar, BoxPlot, HeatMap, Pie, Scatter, ScatterPolar, Trace};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

const RESPIRATION_COLOR: &str = "skyblue";
const HEART_RATE_COLOR: &str = "orange";

/// Every chart the dashboard can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FigureKind {
    DailyVitals,
    WeeklyVitals,
    SleepComparison,
    SleepActivity,
    SleepCalendar,
    FallCalendar,
    Distance,
    RoomTransitions,
    HeartRateGauge,
    ActivityStates,
    ActivityLog,
    HealthRadar,
    PlaceDonut,
}

impl FigureKind {
    pub const ALL: [FigureKind; 13] = [
        FigureKind::DailyVitals,
        FigureKind::WeeklyVitals,
        FigureKind::SleepComparison,
        FigureKind::SleepActivity,
        FigureKind::SleepCalendar,
        FigureKind::FallCalendar,
        FigureKind::Distance,
        FigureKind::RoomTransitions,
        FigureKind::HeartRateGauge,
        FigureKind::ActivityStates,
        FigureKind::ActivityLog,
        FigureKind::HealthRadar,
        FigureKind::PlaceDonut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FigureKind::DailyVitals => "daily_vitals",
            FigureKind::WeeklyVitals => "weekly_vitals",
            FigureKind::SleepComparison => "sleep_comparison",
            FigureKind::SleepActivity => "sleep_activity",
            FigureKind::SleepCalendar => "sleep_calendar",
            FigureKind::FallCalendar => "fall_calendar",
            FigureKind::Distance => "distance",
            FigureKind::RoomTransitions => "room_transitions",
            FigureKind::HeartRateGauge => "heart_rate_gauge",
            FigureKind::ActivityStates => "activity_states",
            FigureKind::ActivityLog => "activity_log",
            FigureKind::HealthRadar => "health_radar",
            FigureKind::PlaceDonut => "place_donut",
        }
    }

    /// Dataset the figure is drawn from
    pub fn dataset(&self) -> Dataset {
        match self {
            FigureKind::DailyVitals => Dataset::DailyVitals,
            FigureKind::WeeklyVitals => Dataset::WeeklyVitals,
            FigureKind::SleepComparison => Dataset::SleepSummary,
            FigureKind::SleepActivity | FigureKind::SleepCalendar => Dataset::MonthlySleep,
            FigureKind::FallCalendar => Dataset::Falls,
            FigureKind::Distance => Dataset::Distance,
            FigureKind::RoomTransitions => Dataset::RoomTransitions,
            FigureKind::HeartRateGauge => Dataset::Realtime,
            FigureKind::ActivityStates | FigureKind::ActivityLog => Dataset::ActivityStates,
            FigureKind::HealthRadar => Dataset::HealthScores,
            FigureKind::PlaceDonut => Dataset::PlaceShares,
        }
    }

    /// DOM id used when the figure is embedded in a page
    pub fn element_id(&self) -> String {
        format!("fig-{}", self.as_str().replace('_', "-"))
    }

    pub fn build(&self, store: &DataStore, settings: &ChartSettings) -> Result<Figure> {
        let figure = match self {
            FigureKind::DailyVitals => daily_vitals(store.daily_vitals()?, settings),
            FigureKind::WeeklyVitals => {
                weekly_vitals(store.weekly_vitals()?, settings.weekly_metric, settings)
            }
            FigureKind::SleepComparison => {
                sleep_comparison(store.sleep_summary()?, settings.comparison_order)
            }
            FigureKind::SleepActivity => sleep_activity(store.monthly_sleep()?, settings),
            FigureKind::SleepCalendar => sleep_calendar(store.monthly_sleep()?, settings)?,
            FigureKind::FallCalendar => fall_calendar(store.falls()?, settings)?,
            FigureKind::Distance => distance(store.distance()?, settings),
            FigureKind::RoomTransitions => room_transitions(store.room_transitions()?, settings)?,
            FigureKind::HeartRateGauge => heart_rate_gauge(store.realtime()?, &settings.gauge),
            FigureKind::ActivityStates => activity_states(store.activity_states()?, settings)?,
            FigureKind::ActivityLog => activity_log(store.activity_states()?, settings)?,
            FigureKind::HealthRadar => health_radar(store.health_scores()?),
            FigureKind::PlaceDonut => place_donut(store.place_shares()?),
        };
        debug!(figure = self.as_str(), "built figure");
        Ok(figure)
    }
}

impl fmt::Display for FigureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FigureKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FigureKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown figure kind: {}", s))
    }
}

fn whole(v: f64) -> String {
    format!("{}", v as i64)
}

/// Horizontal legend above the top-left corner of the plot
fn top_legend() -> Legend {
    Legend::new()
        .orientation(Orientation::Horizontal)
        .x(0.0)
        .y(1.02)
}

fn stepped(stops: &[(f64, String)]) -> ColorScale {
    ColorScale::Vector(
        stops
            .iter()
            .map(|(at, color)| ColorScaleElement(*at, color.clone()))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// Hourly heart rate and respiration with the day's mean drawn across
pub fn daily_vitals(readings: &[VitalReading], settings: &ChartSettings) -> Figure {
    let hours: Vec<u32> = readings.iter().map(|r| r.hour).collect();
    let respiration = Overlay::new(readings.iter().map(|r| r.respiration_rate).collect());
    let heart_rate = Overlay::new(readings.iter().map(|r| r.heart_rate).collect());

    let mut traces: Vec<Box<dyn Trace>> = Vec::new();
    let mut shapes = Vec::new();
    let mut annotations = Vec::new();
    for (overlay, color, name) in [
        (&respiration, RESPIRATION_COLOR, "呼吸数"),
        (&heart_rate, HEART_RATE_COLOR, "心拍数"),
    ] {
        traces.push(
            Scatter::new(hours.clone(), overlay.values.clone())
                .name(name)
                .mode(Mode::LinesMarkersText)
                .line(Line::new().color(color).width(4.0))
                .marker(Marker::new().color(color).size(8))
                .text_array(peak_labels(&overlay.values, whole))
                .text_position(Position::TopCenter),
        );

        // No reference line for an empty day
        if let Some(avg) = overlay.mean.value() {
            shapes.push(mean_line(avg, color));
            annotations.push(mean_label(avg, color));
        }
    }

    let layout = base_layout(settings.height)
        .x_axis(Axis::new().tick_mode(TickMode::Linear).tick0(0.0).dtick(1.0))
        .legend(top_legend())
        .shapes(shapes)
        .annotations(annotations);
    figure(traces, layout)
}

/// One box per day drawn from its five-number summary
pub fn weekly_vitals(
    summaries: &[WeeklyVitalSummary],
    metric: VitalMetric,
    settings: &ChartSettings,
) -> Figure {
    let color = match metric {
        VitalMetric::HeartRate => "pink",
        VitalMetric::Respiration => "lightblue",
    };

    let traces: Vec<Box<dyn Trace>> = summaries
        .iter()
        .map(|summary| -> Box<dyn Trace> {
            BoxPlot::<f64, f64>::new(five_number(summary, metric).to_vec())
                .name(&summary.date.to_string())
                .marker(Marker::new().color(color))
        })
        .collect();

    let layout = base_layout(settings.height)
        .y_axis(Axis::new().title(metric.label()))
        .show_legend(false);
    figure(traces, layout)
}

/// Heart-rate dial with the normal band shaded
pub fn heart_rate_gauge(vitals: &RealtimeVitals, gauge: &GaugeSettings) -> Figure {
    let dial = Gauge {
        axis: GaugeAxis {
            range: [0.0, gauge.max],
        },
        bar: GaugeBar {
            color: "#EC8177".to_string(),
        },
        steps: vec![
            GaugeStep {
                range: [0.0, gauge.normal_low],
                color: "#E8F6FF".to_string(),
            },
            GaugeStep {
                range: [gauge.normal_low, gauge.normal_high],
                color: "#CBF7C4".to_string(),
            },
            GaugeStep {
                range: [gauge.normal_high, gauge.max],
                color: "#FCDCDC".to_string(),
            },
        ],
    };

    let layout = base_layout(250).margin(Margin::new().left(20).right(20).top(20).bottom(20));
    figure(
        vec![Indicator::gauge(vitals.heart_rate, dial).suffix(" bpm")],
        layout,
    )
}

// ---------------------------------------------------------------------------
// Sleep and activity
// ---------------------------------------------------------------------------

/// Yesterday against today for sleep and active hours, as grouped bars
pub fn sleep_comparison(summary: &SleepActivitySummary, order: ComparisonOrder) -> Figure {
    let categories = Comparison::new("昨日", "今日").arrange(order).to_vec();
    let sleep = Comparison::new(summary.yesterday_sleep_hours, summary.sleep_hours).arrange(order);
    let active =
        Comparison::new(summary.yesterday_active_hours, summary.active_hours).arrange(order);

    let longest = sleep.iter().chain(active.iter()).copied().fold(9.0, f64::max);

    let traces: Vec<Box<dyn Trace>> = [(sleep, "睡眠時間", "lightblue"), (active, "活動時間", "orange")]
        .into_iter()
        .map(|(values, name, color)| -> Box<dyn Trace> {
            Bar::new(values.to_vec(), categories.clone())
                .orientation(Orientation::Horizontal)
                .name(name)
                .marker(Marker::new().color(color))
                .text_array(values.iter().map(|v| v.to_string()).collect::<Vec<_>>())
                .text_position(TextPosition::Inside)
                .text_font(Font::new().color("white").size(14))
        })
        .collect();

    let layout = base_layout(200)
        .margin(Margin::new().left(0).right(0).top(10).bottom(10))
        .x_axis(
            Axis::new()
                .title("活動時間(h)")
                .range(vec![0.0, longest])
                .show_tick_labels(false),
        )
        .bar_mode(BarMode::Group)
        .show_legend(false);
    figure(traces, layout)
}

/// Sleep hours filled from zero with active hours stacked above
pub fn sleep_activity(days: &[DailySleepActivity], settings: &ChartSettings) -> Figure {
    let dates: Vec<String> = days.iter().map(|d| d.date.to_string()).collect();
    let sleep: Vec<f64> = days.iter().map(|d| d.sleep_hours).collect();
    let active: Vec<f64> = days.iter().map(|d| d.active_hours).collect();
    let awake_total = stack(&sleep, &active);

    let traces: Vec<Box<dyn Trace>> = vec![
        Scatter::new(dates.clone(), sleep)
            .name("睡眠時間")
            .mode(Mode::Lines)
            .line(Line::new().color(RESPIRATION_COLOR))
            .fill(Fill::ToZeroY),
        Scatter::new(dates, awake_total)
            .name("活動時間")
            .mode(Mode::Lines)
            .line(Line::new().color(HEART_RATE_COLOR))
            .fill(Fill::ToNextY),
    ];

    let layout = base_layout(settings.height)
        .y_axis(Axis::new().title("時間（h）"))
        .x_axis(Axis::new().tick_format("%m/%d"))
        .legend(top_legend());
    figure(traces, layout)
}

/// Color scale and range of a week-by-weekday calendar
#[derive(Debug, Clone)]
pub struct CalendarStyle {
    pub colorscale: Vec<(f64, String)>,
    pub zmax: f64,
}

impl CalendarStyle {
    /// Grey for zero, then light to deep blue
    pub fn sleep(zmax: f64) -> Self {
        CalendarStyle {
            colorscale: vec![
                (0.0, "lightgray".to_string()),
                (0.01, "lightblue".to_string()),
                (1.0, "deepskyblue".to_string()),
            ],
            zmax,
        }
    }

    /// Grey for zero, then yellow through red
    pub fn falls(zmax: f64) -> Self {
        CalendarStyle {
            colorscale: vec![
                (0.0, "lightgray".to_string()),
                (0.01, "rgb(255,255,204)".to_string()),
                (0.5, "rgb(252,141,89)".to_string()),
                (1.0, "rgb(215,48,39)".to_string()),
            ],
            zmax,
        }
    }
}

/// Week by weekday heatmap, latest week on top
///
/// Repeated (week, weekday) entries are averaged. Cells with no entry stay
/// empty and show the no-data background; the others carry their value as
/// a text label.
pub fn calendar_heatmap<'a, I>(entries: I, style: &CalendarStyle, height: u32) -> Result<Figure>
where
    I: IntoIterator<Item = (u32, &'a str, f64)>,
{
    let grid = pivot(entries, &PivotSpec::calendar())?;
    let y: Vec<String> = grid.rows().iter().map(|w| format!("{}週目", w)).collect();
    Ok(heatmap_figure(
        &grid,
        y,
        HeatmapStyle {
            color_scale: stepped(&style.colorscale),
            z_range: Some((0.0, style.zmax)),
            cell_labels: true,
            x_axis: Axis::new(),
        },
        height,
    ))
}

pub fn sleep_calendar(days: &[DailySleepActivity], settings: &ChartSettings) -> Result<Figure> {
    calendar_heatmap(
        days.iter()
            .map(|d| (d.week, d.weekday.as_str(), d.sleep_hours)),
        &CalendarStyle::sleep(settings.sleep_zmax),
        settings.height,
    )
}

pub fn fall_calendar(falls: &[FallCount], settings: &ChartSettings) -> Result<Figure> {
    calendar_heatmap(
        falls.iter().map(|f| (f.week, f.weekday.as_str(), f.count)),
        &CalendarStyle::falls(settings.fall_zmax),
        settings.height,
    )
}

/// Hour-by-hour activity state per day in the state colors
pub fn activity_states(samples: &[ActivityStateSample], settings: &ChartSettings) -> Result<Figure> {
    let scale = CategoryScale::activity_states();
    let mut entries = Vec::with_capacity(samples.len());
    for s in samples {
        entries.push((s.date, s.hour.to_string(), scale.code(&s.state)? as f64));
    }
    let grid = pivot(entries, &PivotSpec::hourly())?;
    let y = grid.rows().iter().map(|d| d.to_string()).collect();

    Ok(heatmap_figure(
        &grid,
        y,
        HeatmapStyle {
            color_scale: stepped(&scale.colorscale()),
            z_range: Some(scale.z_range()),
            cell_labels: false,
            x_axis: hour_axis(),
        },
        settings.height,
    ))
}

/// Hours per state per day, stacked
pub fn activity_log(samples: &[ActivityStateSample], settings: &ChartSettings) -> Result<Figure> {
    let scale = CategoryScale::activity_states();
    let counts = count_by_category(samples.iter().map(|s| (s.date, s.state.as_str())), &scale)?;
    let dates: Vec<String> = counts.periods.iter().map(|d| d.to_string()).collect();

    let traces: Vec<Box<dyn Trace>> = scale
        .categories()
        .iter()
        .zip(&counts.counts)
        .map(|(category, hours)| -> Box<dyn Trace> {
            let name = category.aliases.first().unwrap_or(&category.label);
            Bar::new(dates.clone(), hours.clone())
                .name(name)
                .marker(Marker::new().color(category.color.clone()))
        })
        .collect();

    let layout = base_layout(settings.height)
        .bar_mode(BarMode::Stack)
        .legend(top_legend())
        .y_axis(Axis::new().title("時間（h）").range(vec![0.0, 24.0]))
        .x_axis(Axis::new().tick_format("%m/%d"));
    Ok(figure(traces, layout))
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// In-bed and out-of-bed distance through the day
pub fn distance(samples: &[DistanceSample], settings: &ChartSettings) -> Figure {
    let times: Vec<String> = samples.iter().map(|s| s.time.clone()).collect();
    let in_bed: Vec<f64> = samples.iter().map(|s| s.in_bed).collect();
    let out_of_bed: Vec<f64> = samples.iter().map(|s| s.out_of_bed).collect();
    let thousands = |v: f64| format!("{:.2}K", v / 1000.0);

    let traces: Vec<Box<dyn Trace>> = [
        (in_bed, "ベッド内移動距離（cm）", "lightblue"),
        (out_of_bed, "ベッド外移動距離（cm）", "darkblue"),
    ]
    .into_iter()
    .map(|(values, name, color)| -> Box<dyn Trace> {
        let labels = peak_labels(&values, thousands);
        Scatter::new(times.clone(), values)
            .name(name)
            .mode(Mode::LinesMarkersText)
            .line(Line::new().color(color).width(4.0))
            .marker(Marker::new().color(color).size(8))
            .text_array(labels)
            .text_position(Position::TopCenter)
    })
    .collect();

    let layout = base_layout(settings.height)
        .y_axis(
            Axis::new()
                .title("距離（m）")
                .tick_format(",")
                .range(vec![0.0, settings.distance_axis_max]),
        )
        .legend(top_legend());
    figure(traces, layout)
}

/// Room entries per date and hour, darker for busier hours
pub fn room_transitions(rows: &[RoomTransition], settings: &ChartSettings) -> Result<Figure> {
    let grid = pivot(
        rows.iter().map(|r| (r.date, r.hour.to_string(), r.count)),
        &PivotSpec::hourly(),
    )?;
    let y = grid.rows().iter().map(|d| d.to_string()).collect();
    Ok(heatmap_figure(
        &grid,
        y,
        HeatmapStyle {
            color_scale: ColorScale::Palette(ColorScalePalette::Greys),
            z_range: None,
            cell_labels: false,
            x_axis: hour_axis(),
        },
        settings.height,
    ))
}

fn hour_axis() -> Axis {
    Axis::new().title("時間(h）").n_ticks(24)
}

/// How a pivot grid is drawn
struct HeatmapStyle {
    color_scale: ColorScale,
    /// Pinned color range; `None` lets plotly fit the data
    z_range: Option<(f64, f64)>,
    /// Print each filled cell's value on top of it
    cell_labels: bool,
    x_axis: Axis,
}

/// Draw a grid as a heatmap; the plot background marks no-data cells
fn heatmap_figure<K>(grid: &PivotGrid<K>, y: Vec<String>, style: HeatmapStyle, height: u32) -> Figure {
    let (rows, columns) = grid.dimensions();
    if grid.filled_count() == 0 {
        warn!(axis = grid.columns().name(), rows, columns, "heatmap has no data");
    }

    let x = grid.columns().ticks().to_vec();
    // Rows and color bounds share plotly's z element type, so both go in as JSON;
    // a missing cell serializes as null
    let z: Vec<Value> = grid.cells().iter().map(|row| json!(row)).collect();
    let mut heatmap = HeatMap::new(x.clone(), y.clone(), z)
        .color_scale(style.color_scale)
        .hover_on_gaps(false)
        .show_scale(false);
    if let Some((zmin, zmax)) = style.z_range {
        heatmap = heatmap.zmin(zmin).zmax(zmax);
    }

    let mut traces: Vec<Box<dyn Trace>> = vec![heatmap];
    if style.cell_labels {
        traces.push(cell_labels(grid, &x, &y));
    }

    let layout = base_layout(height)
        .plot_background_color(NO_DATA_COLOR)
        .x_axis(style.x_axis)
        .y_axis(Axis::new().type_(AxisType::Category));
    figure(traces, layout)
}

/// Text-only scatter placing each filled cell's value over the heatmap
fn cell_labels<K>(grid: &PivotGrid<K>, x: &[String], y: &[String]) -> Box<dyn Trace> {
    let mut label_x = Vec::new();
    let mut label_y = Vec::new();
    let mut text = Vec::new();
    for (row, row_name) in grid.text_labels(whole).into_iter().zip(y) {
        for (label, column_name) in row.into_iter().zip(x) {
            if !label.is_empty() {
                label_x.push(column_name.clone());
                label_y.push(row_name.clone());
                text.push(label);
            }
        }
    }

    Scatter::new(label_x, label_y)
        .mode(Mode::Text)
        .text_array(text)
        .text_font(Font::new().color("black").size(12))
        .show_legend(false)
        .hover_info(HoverInfo::None)
}

// ---------------------------------------------------------------------------
// Monthly summaries
// ---------------------------------------------------------------------------

/// Closed polygon of this month's health scores
pub fn health_radar(scores: &[HealthScore]) -> Figure {
    let mut r: Vec<f64> = scores.iter().map(|s| s.score).collect();
    let mut theta: Vec<String> = scores.iter().map(|s| s.category.clone()).collect();
    if let (Some(&first_r), Some(first_theta)) = (r.first(), theta.first().cloned()) {
        r.push(first_r);
        theta.push(first_theta);
    }

    let radar = ScatterPolar::new(theta, r)
        .name("健康スコア")
        .fill(Fill::ToSelf)
        .line(Line::new().color("#FCB917"));
    figure(vec![radar], base_layout(300).show_legend(false))
}

/// Share of this month's hours spent in each place
pub fn place_donut(places: &[PlaceShare]) -> Figure {
    let donut = Pie::new(places.iter().map(|p| p.hours).collect())
        .labels(places.iter().map(|p| p.place.as_str()).collect())
        .hole(0.5);
    figure(vec![donut], base_layout(300).show_legend(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::to_value;
    use crate::error::DashboardError;
    use chrono::NaiveDate;

    fn settings() -> ChartSettings {
        ChartSettings::default()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, day).unwrap()
    }

    fn reading(hour: u32, heart_rate: f64, respiration_rate: f64) -> VitalReading {
        VitalReading {
            hour,
            heart_rate,
            respiration_rate,
        }
    }

    fn state(day: u32, hour: u32, label: &str) -> ActivityStateSample {
        ActivityStateSample {
            date: date(day),
            hour,
            state: label.to_string(),
        }
    }

    fn room(date: NaiveDate, hour: u32, count: f64) -> RoomTransition {
        RoomTransition { date, hour, count }
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in FigureKind::ALL {
            assert_eq!(kind.as_str().parse::<FigureKind>().unwrap(), kind);
        }
        assert!("sparkline".parse::<FigureKind>().is_err());
        assert_eq!(FigureKind::RoomTransitions.element_id(), "fig-room-transitions");
    }

    #[test]
    fn test_daily_vitals_mean_lines_and_peaks() {
        let readings = vec![reading(0, 70.0, 14.0), reading(1, 80.0, 16.0), reading(2, 90.0, 15.0)];
        let value = to_value(&daily_vitals(&readings, &settings()));

        assert_eq!(value["data"].as_array().unwrap().len(), 2);
        assert_eq!(value["data"][0]["mode"], "lines+markers+text");
        assert_eq!(value["data"][1]["text"], json!(["", "", "90"]));
        assert_eq!(value["data"][0]["text"], json!(["", "16", ""]));

        let shapes = value["layout"]["shapes"].as_array().unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[1]["y0"], 80.0);
        assert_eq!(value["layout"]["annotations"][1]["text"], "(平均) 80.0");
        assert_eq!(value["layout"]["xaxis"]["dtick"], 1.0);
    }

    #[test]
    fn test_daily_vitals_empty_day_has_no_mean_line() {
        let value = to_value(&daily_vitals(&[], &settings()));
        assert_eq!(value["data"].as_array().unwrap().len(), 2);
        let no_shapes = value["layout"]["shapes"]
            .as_array()
            .map_or(true, |s| s.is_empty());
        assert!(no_shapes);
    }

    #[test]
    fn test_weekly_vitals_one_box_per_day() {
        let summaries = vec![WeeklyVitalSummary {
            date: date(4),
            heart_rate_min: 60.0,
            heart_rate_q1: 65.0,
            heart_rate_median: 70.0,
            heart_rate_q3: 75.0,
            heart_rate_max: 90.0,
            respiration_min: 12.0,
            respiration_q1: 13.0,
            respiration_median: 14.0,
            respiration_q3: 15.0,
            respiration_max: 18.0,
        }];
        let value = to_value(&weekly_vitals(&summaries, VitalMetric::HeartRate, &settings()));
        assert_eq!(value["data"][0]["type"], "box");
        assert_eq!(value["data"][0]["name"], "2024-11-04");
        assert_eq!(value["data"][0]["y"], json!([60.0, 65.0, 70.0, 75.0, 90.0]));
        assert_eq!(value["data"][0]["marker"]["color"], "pink");
        assert_eq!(value["layout"]["showlegend"], false);
    }

    #[test]
    fn test_sleep_comparison_respects_order() {
        let summary = SleepActivitySummary {
            wake_time: "6:30".to_string(),
            bed_time: "21:00".to_string(),
            sleep_hours: 7.5,
            yesterday_sleep_hours: 6.0,
            active_hours: 8.0,
            yesterday_active_hours: 9.5,
        };
        let value = to_value(&sleep_comparison(&summary, ComparisonOrder::PreviousFirst));
        assert_eq!(value["data"][0]["y"], json!(["昨日", "今日"]));
        assert_eq!(value["data"][0]["x"], json!([6.0, 7.5]));
        assert_eq!(value["data"][0]["orientation"], "h");
        assert_eq!(value["data"][0]["textposition"], "inside");

        let value = to_value(&sleep_comparison(&summary, ComparisonOrder::CurrentFirst));
        assert_eq!(value["data"][0]["y"], json!(["今日", "昨日"]));
        assert_eq!(value["data"][1]["x"], json!([8.0, 9.5]));
        assert_eq!(value["layout"]["xaxis"]["range"], json!([0.0, 9.5]));
    }

    #[test]
    fn test_sleep_activity_stacks_active_on_sleep() {
        let days = vec![DailySleepActivity {
            date: date(1),
            week: 1,
            weekday: "金曜日".to_string(),
            sleep_hours: 7.0,
            active_hours: 5.5,
        }];
        let value = to_value(&sleep_activity(&days, &settings()));
        assert_eq!(value["data"][0]["fill"], "tozeroy");
        assert_eq!(value["data"][1]["y"], json!([12.5]));
        assert_eq!(value["data"][1]["fill"], "tonexty");
    }

    #[test]
    fn test_fall_calendar_keeps_no_data_distinct_from_zero() {
        let falls = vec![
            FallCount {
                week: 1,
                weekday: "日曜日".to_string(),
                count: 0.0,
            },
            FallCount {
                week: 2,
                weekday: "水曜日".to_string(),
                count: 2.0,
            },
        ];
        let value = to_value(&fall_calendar(&falls, &settings()).unwrap());
        let heatmap = &value["data"][0];
        let z = &heatmap["z"];

        // latest week first
        assert_eq!(heatmap["y"], json!(["2週目", "1週目"]));
        assert_eq!(z[0][3], 2.0);
        assert_eq!(z[1][0], 0.0);
        assert!(z[1][1].is_null());
        assert_eq!(heatmap["x"][0], "Sun");
        assert_eq!(heatmap["zmin"], 0.0);
        assert_eq!(heatmap["hoverongaps"], false);
        assert_eq!(value["layout"]["plot_bgcolor"], NO_DATA_COLOR);
    }

    #[test]
    fn test_calendar_labels_only_filled_cells() {
        let falls = vec![
            FallCount {
                week: 1,
                weekday: "日曜日".to_string(),
                count: 0.0,
            },
            FallCount {
                week: 1,
                weekday: "土曜日".to_string(),
                count: 3.0,
            },
        ];
        let value = to_value(&fall_calendar(&falls, &settings()).unwrap());
        let labels = &value["data"][1];
        assert_eq!(labels["mode"], "text");
        assert_eq!(labels["hoverinfo"], "none");
        assert_eq!(labels["x"], json!(["Sun", "Sat"]));
        assert_eq!(labels["y"], json!(["1週目", "1週目"]));
        assert_eq!(labels["text"], json!(["0", "3"]));
    }

    #[test]
    fn test_calendar_rejects_unknown_weekday() {
        let days = vec![DailySleepActivity {
            date: date(1),
            week: 1,
            weekday: "Holiday".to_string(),
            sleep_hours: 7.0,
            active_hours: 5.0,
        }];
        assert!(matches!(
            sleep_calendar(&days, &settings()),
            Err(DashboardError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_room_transitions_grid_shape() {
        let rows = vec![room(date(1), 7, 2.0), room(date(2), 13, 3.0)];
        let value = to_value(&room_transitions(&rows, &settings()).unwrap());
        let heatmap = &value["data"][0];
        let z = heatmap["z"].as_array().unwrap();

        assert_eq!(z.len(), 2);
        assert!(z.iter().all(|row| row.as_array().unwrap().len() == 24));
        assert_eq!(heatmap["y"], json!(["2024-11-02", "2024-11-01"]));
        assert_eq!(z[0][13], 3.0);
        assert!(z[0][7].is_null());
        assert_eq!(value["layout"]["xaxis"]["nticks"], 24);
    }

    #[test]
    fn test_room_transitions_keeps_same_day_of_different_years_apart() {
        let last_year = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let rows = vec![room(last_year, 9, 1.0), room(date(1), 9, 4.0)];
        let value = to_value(&room_transitions(&rows, &settings()).unwrap());
        let heatmap = &value["data"][0];

        assert_eq!(heatmap["y"], json!(["2024-11-01", "2023-11-01"]));
        assert_eq!(heatmap["z"][0][9], 4.0);
        assert_eq!(heatmap["z"][1][9], 1.0);
    }

    #[test]
    fn test_activity_states_codes_and_unknown_label() {
        let samples = vec![state(1, 0, "就寝"), state(1, 12, "室外"), state(1, 18, "室内")];
        let value = to_value(&activity_states(&samples, &settings()).unwrap());
        let heatmap = &value["data"][0];
        assert_eq!(heatmap["z"][0][0], 0.0);
        assert_eq!(heatmap["z"][0][12], 2.0);
        assert_eq!(heatmap["z"][0][18], 1.0);
        assert_eq!(heatmap["zmin"], -0.5);
        assert_eq!(heatmap["zmax"], 2.5);
        assert_eq!(heatmap["y"], json!(["2024-11-01"]));

        let err = activity_states(&[state(1, 3, "お風呂")], &settings()).err().unwrap();
        assert!(matches!(err, DashboardError::UnknownLabel { .. }));
    }

    #[test]
    fn test_activity_log_stacks_hours_per_state() {
        let samples = vec![state(1, 0, "就寝"), state(1, 1, "就寝"), state(2, 9, "室外")];
        let value = to_value(&activity_log(&samples, &settings()).unwrap());
        assert_eq!(value["data"].as_array().unwrap().len(), 3);
        assert_eq!(value["data"][0]["name"], "就寝");
        assert_eq!(value["data"][0]["y"], json!([2, 0]));
        assert_eq!(value["data"][2]["y"], json!([0, 1]));
        assert_eq!(value["layout"]["barmode"], "stack");
    }

    #[test]
    fn test_distance_peak_labels_in_thousands() {
        let samples = vec![
            DistanceSample {
                time: "08:00".to_string(),
                in_bed: 120.0,
                out_of_bed: 2450.0,
            },
            DistanceSample {
                time: "12:00".to_string(),
                in_bed: 300.0,
                out_of_bed: 800.0,
            },
        ];
        let value = to_value(&distance(&samples, &settings()));
        assert_eq!(value["data"][1]["text"], json!(["2.45K", ""]));
        assert_eq!(value["layout"]["yaxis"]["range"], json!([0.0, 3000.0]));
    }

    #[test]
    fn test_gauge_uses_configured_band() {
        let vitals = RealtimeVitals {
            heart_rate: 72.0,
            yesterday_heart_rate_avg: 70.0,
            respiration_rate: 14.0,
            yesterday_respiration_avg: 15.0,
        };
        let value = to_value(&heart_rate_gauge(&vitals, &GaugeSettings::default()));
        assert_eq!(value["data"][0]["type"], "indicator");
        assert_eq!(value["data"][0]["value"], 72.0);
        assert_eq!(value["data"][0]["gauge"]["steps"][1]["range"], json!([60.0, 100.0]));
        assert_eq!(value["layout"]["height"], 250);
    }

    #[test]
    fn test_radar_polygon_is_closed() {
        let scores = vec![
            HealthScore {
                category: "睡眠".to_string(),
                score: 4.0,
            },
            HealthScore {
                category: "活動".to_string(),
                score: 3.0,
            },
        ];
        let value = to_value(&health_radar(&scores));
        let radar = &value["data"][0];
        assert_eq!(radar["type"], "scatterpolar");
        assert_eq!(radar["r"], json!([4.0, 3.0, 4.0]));
        assert_eq!(radar["theta"][0], radar["theta"][2]);
        assert_eq!(radar["fill"], "toself");

        let empty = to_value(&health_radar(&[]));
        assert_eq!(empty["data"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_place_donut_has_hole() {
        let places = vec![
            PlaceShare {
                place: "居室".to_string(),
                hours: 18.0,
            },
            PlaceShare {
                place: "食堂".to_string(),
                hours: 4.0,
            },
        ];
        let value = to_value(&place_donut(&places));
        assert_eq!(value["data"][0]["type"], "pie");
        assert_eq!(value["data"][0]["labels"], json!(["居室", "食堂"]));
        assert_eq!(value["data"][0]["hole"], 0.5);
    }

    #[test]
    fn test_build_reports_unloaded_dataset() {
        let store = DataStore::default();
        let err = FigureKind::PlaceDonut.build(&store, &settings()).err().unwrap();
        assert!(matches!(err, DashboardError::NotLoaded(Dataset::PlaceShares)));
        assert!(err.to_string().starts_with("data not found"));
    }
}
