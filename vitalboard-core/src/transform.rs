//! Tabular-to-visual transforms
//!
//! Pure functions that reshape loaded rows into what a chart needs: pivot
//! grids over fixed axes, category codes for discrete color scales, mean
//! overlays, ratios, and ordering of paired values.
//!
//! Global invariants enforced:
//! - Grid dimensions are (distinct periods) x (axis length), however sparse the input
//! - A missing cell is `None`, never zero
//! - Labels outside a fixed category set or axis are errors, never defaulted
//! - Empty series and zero denominators yield `Computed::Undefined`

use crate::error::{DashboardError, Result};
use crate::records::{AnomalyEvent, Severity, WeeklyVitalSummary};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A derived number that may not be defined for the input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Computed {
    Value(f64),
    Undefined,
}

impl Computed {
    pub fn value(&self) -> Option<f64> {
        match self {
            Computed::Value(v) => Some(*v),
            Computed::Undefined => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Computed {
        match self {
            Computed::Value(v) => Computed::Value(f(v)),
            Computed::Undefined => Computed::Undefined,
        }
    }
}

impl fmt::Display for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Value(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            Computed::Undefined => f.write_str("N/A"),
        }
    }
}

impl Serialize for Computed {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Arithmetic mean; undefined for an empty series
pub fn mean(values: &[f64]) -> Computed {
    if values.is_empty() {
        return Computed::Undefined;
    }
    Computed::Value(values.iter().sum::<f64>() / values.len() as f64)
}

/// A series together with its mean, for drawing a reference line over it
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub values: Vec<f64>,
    pub mean: Computed,
}

impl Overlay {
    pub fn new(values: Vec<f64>) -> Self {
        let mean = mean(&values);
        Overlay { values, mean }
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

/// `current / previous`; undefined when `previous` is zero
pub fn ratio(current: f64, previous: f64) -> Computed {
    if previous == 0.0 || !current.is_finite() || !previous.is_finite() {
        return Computed::Undefined;
    }
    Computed::Value(current / previous)
}

/// `(current - previous) / previous`; undefined when `previous` is zero
pub fn relative_change(current: f64, previous: f64) -> Computed {
    ratio(current, previous).map(|r| r - 1.0)
}

/// Labels for the points equal to the series maximum, empty elsewhere
pub fn peak_labels(values: &[f64], label: impl Fn(f64) -> String) -> Vec<String> {
    let Some(max) = values.iter().copied().filter(|v| !v.is_nan()).reduce(f64::max) else {
        return Vec::new();
    };
    values
        .iter()
        .map(|&v| if v == max { label(v) } else { String::new() })
        .collect()
}

/// Element-wise sum, for stacking one area on top of another
pub fn stack(base: &[f64], top: &[f64]) -> Vec<f64> {
    base.iter().zip(top).map(|(b, t)| b + t).collect()
}

/// Split fractional hours into whole hours and minutes
pub fn split_hours(hours: f64) -> (u32, u32) {
    let minutes = (hours.max(0.0) * 60.0).round() as u32;
    (minutes / 60, minutes % 60)
}

// ---------------------------------------------------------------------------
// Paired comparisons
// ---------------------------------------------------------------------------

/// Order in which a (previous, current) pair is laid out on a chart axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOrder {
    #[default]
    PreviousFirst,
    CurrentFirst,
}

impl ComparisonOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOrder::PreviousFirst => "previous_first",
            ComparisonOrder::CurrentFirst => "current_first",
        }
    }
}

/// A value for the previous period and one for the current period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison<T> {
    pub previous: T,
    pub current: T,
}

impl<T: Copy> Comparison<T> {
    pub fn new(previous: T, current: T) -> Self {
        Comparison { previous, current }
    }

    pub fn arrange(&self, order: ComparisonOrder) -> [T; 2] {
        match order {
            ComparisonOrder::PreviousFirst => [self.previous, self.current],
            ComparisonOrder::CurrentFirst => [self.current, self.previous],
        }
    }
}

// ---------------------------------------------------------------------------
// Pivot grids
// ---------------------------------------------------------------------------

/// A fixed, ordered set of category keys with display ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    name: String,
    keys: Vec<String>,
    ticks: Vec<String>,
}

const WEEKDAY_KEYS: [&str; 7] = [
    "日曜日", "月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日",
];
const WEEKDAY_TICKS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

impl Axis {
    pub fn new(name: impl Into<String>, keys: Vec<String>) -> Self {
        let ticks = keys.clone();
        Axis {
            name: name.into(),
            keys,
            ticks,
        }
    }

    /// Replace the display ticks; a count that does not match the keys is ignored
    fn with_ticks(mut self, ticks: Vec<String>) -> Self {
        if ticks.len() == self.keys.len() {
            self.ticks = ticks;
        }
        self
    }

    /// Sunday through Saturday
    pub fn weekdays() -> Self {
        Axis::new(
            "weekday",
            WEEKDAY_KEYS.iter().map(|s| s.to_string()).collect(),
        )
        .with_ticks(WEEKDAY_TICKS.iter().map(|s| s.to_string()).collect())
    }

    /// Hour buckets 0 through 23
    pub fn hours_of_day() -> Self {
        Axis::new("hour", (0..24).map(|h| h.to_string()).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn ticks(&self) -> &[String] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self, key: &str) -> Result<usize> {
        self.keys
            .iter()
            .position(|k| k == key.trim())
            .ok_or_else(|| DashboardError::UnknownCategory {
                axis: self.name.clone(),
                category: key.to_string(),
            })
    }
}

/// Direction of the period axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    Ascending,
    Descending,
}

/// How several values landing in one cell are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAggregation {
    /// Each cell may receive at most one value
    Unique,
    /// Cells receiving several values hold their mean
    Mean,
}

/// Column axis, row order and aggregation for one pivot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotSpec {
    pub columns: Axis,
    pub row_order: RowOrder,
    pub aggregation: CellAggregation,
}

impl PivotSpec {
    /// Week index (latest first) by weekday, averaging repeats
    pub fn calendar() -> Self {
        PivotSpec {
            columns: Axis::weekdays(),
            row_order: RowOrder::Descending,
            aggregation: CellAggregation::Mean,
        }
    }

    /// Date (latest first) by hour of day, one value per cell
    pub fn hourly() -> Self {
        PivotSpec {
            columns: Axis::hours_of_day(),
            row_order: RowOrder::Descending,
            aggregation: CellAggregation::Unique,
        }
    }
}

/// A 2-D grid of optional values over (period, category)
#[derive(Debug, Clone, PartialEq)]
pub struct PivotGrid<K> {
    rows: Vec<K>,
    columns: Axis,
    cells: Vec<Vec<Option<f64>>>,
}

impl<K> PivotGrid<K> {
    pub fn rows(&self) -> &[K] {
        &self.rows
    }

    pub fn columns(&self) -> &Axis {
        &self.columns
    }

    pub fn cells(&self) -> &[Vec<Option<f64>>] {
        &self.cells
    }

    /// (rows, columns)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.cells.get(row).and_then(|r| r.get(column)).copied().flatten()
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Per-cell labels; no-data cells get an empty string
    pub fn text_labels(&self, label: impl Fn(f64) -> String) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.map(&label).unwrap_or_default()).collect())
            .collect()
    }
}

/// Build a grid from (period, category, value) entries
pub fn pivot<K, C, I>(entries: I, spec: &PivotSpec) -> Result<PivotGrid<K>>
where
    K: Ord + Clone + fmt::Display,
    C: AsRef<str>,
    I: IntoIterator<Item = (K, C, f64)>,
{
    let width = spec.columns.len();
    // (sum, count) per cell
    let mut acc: BTreeMap<K, Vec<(f64, u32)>> = BTreeMap::new();

    for (period, category, value) in entries {
        let column = spec.columns.position(category.as_ref())?;
        let row = acc
            .entry(period.clone())
            .or_insert_with(|| vec![(0.0, 0); width]);
        let cell = &mut row[column];
        if cell.1 > 0 && spec.aggregation == CellAggregation::Unique {
            return Err(DashboardError::DuplicateCell {
                row: period.to_string(),
                column: spec.columns.keys()[column].clone(),
            });
        }
        cell.0 += value;
        cell.1 += 1;
    }

    let mut rows = Vec::with_capacity(acc.len());
    let mut cells = Vec::with_capacity(acc.len());
    for (period, row) in acc {
        rows.push(period);
        cells.push(
            row.into_iter()
                .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
                .collect(),
        );
    }
    if spec.row_order == RowOrder::Descending {
        rows.reverse();
        cells.reverse();
    }

    Ok(PivotGrid {
        rows,
        columns: spec.columns.clone(),
        cells,
    })
}

// ---------------------------------------------------------------------------
// Category scales
// ---------------------------------------------------------------------------

/// One label of a discrete scale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub aliases: Vec<String>,
    pub color: String,
}

impl Category {
    pub fn new(label: &str, aliases: &[&str], color: &str) -> Self {
        Category {
            label: label.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            color: color.to_string(),
        }
    }

    fn matches(&self, raw: &str) -> bool {
        self.label == raw || self.aliases.iter().any(|a| a == raw)
    }
}

/// Maps a fixed label set to integer codes and colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScale {
    name: String,
    categories: Vec<Category>,
}

impl CategoryScale {
    pub fn new(name: impl Into<String>, categories: Vec<Category>) -> Self {
        CategoryScale {
            name: name.into(),
            categories,
        }
    }

    /// Asleep (blue), indoor (light blue), outdoor (orange)
    pub fn activity_states() -> Self {
        CategoryScale::new(
            "activity state",
            vec![
                Category::new("asleep", &["就寝", "睡眠"], "#1f5fa8"),
                Category::new("indoor", &["室内"], "#8fd3f4"),
                Category::new("outdoor", &["室外", "外出"], "#f5a142"),
            ],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn code(&self, raw: &str) -> Result<u8> {
        let raw = raw.trim();
        self.categories
            .iter()
            .position(|c| c.matches(raw))
            .map(|i| i as u8)
            .ok_or_else(|| DashboardError::UnknownLabel {
                scale: self.name.clone(),
                label: raw.to_string(),
            })
    }

    /// Stepped colorscale: each code owns an equal band of [0, 1]
    pub fn colorscale(&self) -> Vec<(f64, String)> {
        let n = self.categories.len() as f64;
        self.categories
            .iter()
            .enumerate()
            .flat_map(|(i, c)| {
                let lo = i as f64 / n;
                let hi = (i + 1) as f64 / n;
                [(lo, c.color.clone()), (hi, c.color.clone())]
            })
            .collect()
    }

    /// z range that centres each code inside its colorscale band
    pub fn z_range(&self) -> (f64, f64) {
        (-0.5, self.categories.len() as f64 - 0.5)
    }
}

/// Hours per category per period, for stacked bars
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCounts<K> {
    pub periods: Vec<K>,
    /// `counts[category][period]`
    pub counts: Vec<Vec<u32>>,
}

pub fn count_by_category<'a, K, I>(entries: I, scale: &CategoryScale) -> Result<CategoryCounts<K>>
where
    K: Ord + Clone,
    I: IntoIterator<Item = (K, &'a str)>,
{
    let mut by_period: BTreeMap<K, Vec<u32>> = BTreeMap::new();
    for (period, label) in entries {
        let code = scale.code(label)? as usize;
        by_period
            .entry(period)
            .or_insert_with(|| vec![0; scale.len()])[code] += 1;
    }

    let periods: Vec<K> = by_period.keys().cloned().collect();
    let counts = (0..scale.len())
        .map(|c| by_period.values().map(|row| row[c]).collect())
        .collect();
    Ok(CategoryCounts { periods, counts })
}

// ---------------------------------------------------------------------------
// Event log and vitals helpers
// ---------------------------------------------------------------------------

/// Row indices of events at the given severity
pub fn highlight_rows(events: &[AnomalyEvent], level: Severity) -> Vec<usize> {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.severity.level == level)
        .map(|(i, _)| i)
        .collect()
}

/// Which vital a weekly distribution chart shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalMetric {
    #[default]
    HeartRate,
    Respiration,
}

impl VitalMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalMetric::HeartRate => "heart_rate",
            VitalMetric::Respiration => "respiration",
        }
    }

    /// Axis label used on charts
    pub fn label(&self) -> &'static str {
        match self {
            VitalMetric::HeartRate => "心拍数",
            VitalMetric::Respiration => "呼吸数",
        }
    }
}

/// min, Q1, median, Q3, max of one day for the chosen metric
pub fn five_number(summary: &WeeklyVitalSummary, metric: VitalMetric) -> [f64; 5] {
    match metric {
        VitalMetric::HeartRate => [
            summary.heart_rate_min,
            summary.heart_rate_q1,
            summary.heart_rate_median,
            summary.heart_rate_q3,
            summary.heart_rate_max,
        ],
        VitalMetric::Respiration => [
            summary.respiration_min,
            summary.respiration_q1,
            summary.respiration_median,
            summary.respiration_q3,
            summary.respiration_max,
        ],
    }
}
