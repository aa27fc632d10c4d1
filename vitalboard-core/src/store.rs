//! Data access - typed tables loaded once per page render
//!
//! A `DataStore` is built for a single render from the datasets the page
//! declares, then passed by reference to the transforms and figure
//! builders. Nothing is cached between renders.

use crate::dataset::{Dataset, DatasetFiles};
use crate::error::{DashboardError, Result};
use crate::records::*;
use crate::transform::{ratio, Computed};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// In-memory tables for one render
#[derive(Debug, Default)]
pub struct DataStore {
    realtime: Option<Vec<RealtimeVitals>>,
    daily_vitals: Option<Vec<VitalReading>>,
    weekly_vitals: Option<Vec<WeeklyVitalSummary>>,
    sleep_summary: Option<Vec<SleepActivitySummary>>,
    monthly_sleep: Option<Vec<DailySleepActivity>>,
    movement: Option<Vec<MovementSummary>>,
    distance: Option<Vec<DistanceSample>>,
    room_transitions: Option<Vec<RoomTransition>>,
    falls: Option<Vec<FallCount>>,
    anomalies: Option<Vec<AnomalyEvent>>,
    staff_vitals: Option<Vec<StaffVitals>>,
    activity_states: Option<Vec<ActivityStateSample>>,
    care_events: Option<Vec<CareEvent>>,
    health_scores: Option<Vec<HealthScore>>,
    place_shares: Option<Vec<PlaceShare>>,
}

impl DataStore {
    /// Load the given datasets from `data_dir`
    ///
    /// Fails on the first dataset that is unreadable, lacks a required
    /// column, has a malformed row, or repeats a key.
    pub fn load(data_dir: &Path, files: &DatasetFiles, datasets: &[Dataset]) -> Result<Self> {
        let mut store = DataStore::default();
        for &dataset in datasets {
            let path = files.path(data_dir, dataset);
            match dataset {
                Dataset::Realtime => store.realtime = Some(read_table(&path)?),
                Dataset::DailyVitals => store.daily_vitals = Some(read_table(&path)?),
                Dataset::WeeklyVitals => store.weekly_vitals = Some(read_table(&path)?),
                Dataset::SleepSummary => store.sleep_summary = Some(read_table(&path)?),
                Dataset::MonthlySleep => store.monthly_sleep = Some(read_table(&path)?),
                Dataset::Movement => store.movement = Some(read_table(&path)?),
                Dataset::Distance => store.distance = Some(read_table(&path)?),
                Dataset::RoomTransitions => store.room_transitions = Some(read_table(&path)?),
                Dataset::Falls => store.falls = Some(read_table(&path)?),
                Dataset::Anomalies => store.anomalies = Some(read_table(&path)?),
                Dataset::StaffVitals => store.staff_vitals = Some(read_table(&path)?),
                Dataset::ActivityStates => store.activity_states = Some(read_table(&path)?),
                Dataset::CareEvents => store.care_events = Some(read_table(&path)?),
                Dataset::HealthScores => store.health_scores = Some(read_table(&path)?),
                Dataset::PlaceShares => store.place_shares = Some(read_table(&path)?),
            }
        }
        Ok(store)
    }

    /// Load every known dataset
    pub fn load_all(data_dir: &Path, files: &DatasetFiles) -> Result<Self> {
        Self::load(data_dir, files, &Dataset::ALL)
    }

    pub fn realtime(&self) -> Result<&RealtimeVitals> {
        first_row(&self.realtime, Dataset::Realtime)
    }

    pub fn daily_vitals(&self) -> Result<&[VitalReading]> {
        table(&self.daily_vitals, Dataset::DailyVitals)
    }

    pub fn weekly_vitals(&self) -> Result<&[WeeklyVitalSummary]> {
        table(&self.weekly_vitals, Dataset::WeeklyVitals)
    }

    pub fn sleep_summary(&self) -> Result<&SleepActivitySummary> {
        first_row(&self.sleep_summary, Dataset::SleepSummary)
    }

    pub fn monthly_sleep(&self) -> Result<&[DailySleepActivity]> {
        table(&self.monthly_sleep, Dataset::MonthlySleep)
    }

    pub fn movement(&self) -> Result<&MovementSummary> {
        first_row(&self.movement, Dataset::Movement)
    }

    pub fn distance(&self) -> Result<&[DistanceSample]> {
        table(&self.distance, Dataset::Distance)
    }

    pub fn room_transitions(&self) -> Result<&[RoomTransition]> {
        table(&self.room_transitions, Dataset::RoomTransitions)
    }

    pub fn falls(&self) -> Result<&[FallCount]> {
        table(&self.falls, Dataset::Falls)
    }

    pub fn anomalies(&self) -> Result<&[AnomalyEvent]> {
        table(&self.anomalies, Dataset::Anomalies)
    }

    pub fn staff_vitals(&self) -> Result<&StaffVitals> {
        first_row(&self.staff_vitals, Dataset::StaffVitals)
    }

    pub fn activity_states(&self) -> Result<&[ActivityStateSample]> {
        table(&self.activity_states, Dataset::ActivityStates)
    }

    pub fn care_events(&self) -> Result<&[CareEvent]> {
        table(&self.care_events, Dataset::CareEvents)
    }

    pub fn health_scores(&self) -> Result<&[HealthScore]> {
        table(&self.health_scores, Dataset::HealthScores)
    }

    pub fn place_shares(&self) -> Result<&[PlaceShare]> {
        table(&self.place_shares, Dataset::PlaceShares)
    }

    // Headline scalars

    pub fn real_time_heart_rate(&self) -> Result<f64> {
        Ok(self.realtime()?.heart_rate)
    }

    /// Realtime heart rate relative to yesterday's average
    pub fn heart_rate_change_ratio(&self) -> Result<Computed> {
        let vitals = self.realtime()?;
        Ok(ratio(vitals.heart_rate, vitals.yesterday_heart_rate_avg))
    }

    pub fn real_time_respiration_rate(&self) -> Result<f64> {
        Ok(self.realtime()?.respiration_rate)
    }

    /// Realtime respiration rate relative to yesterday's average
    pub fn respiration_change_ratio(&self) -> Result<Computed> {
        let vitals = self.realtime()?;
        Ok(ratio(vitals.respiration_rate, vitals.yesterday_respiration_avg))
    }

    pub fn today_wake_time(&self) -> Result<&str> {
        Ok(&self.sleep_summary()?.wake_time)
    }

    pub fn today_bed_time(&self) -> Result<&str> {
        Ok(&self.sleep_summary()?.bed_time)
    }

    pub fn today_room_entries(&self) -> Result<f64> {
        Ok(self.movement()?.room_entries)
    }

    pub fn room_entries_change_ratio(&self) -> Result<Computed> {
        let movement = self.movement()?;
        Ok(ratio(movement.room_entries, movement.yesterday_room_entries))
    }

    pub fn today_distance(&self) -> Result<f64> {
        Ok(self.movement()?.distance)
    }

    pub fn distance_change_ratio(&self) -> Result<Computed> {
        let movement = self.movement()?;
        Ok(ratio(movement.distance, movement.yesterday_distance))
    }
}

fn table<T>(slot: &Option<Vec<T>>, dataset: Dataset) -> Result<&[T]> {
    slot.as_deref().ok_or(DashboardError::NotLoaded(dataset))
}

fn first_row<T>(slot: &Option<Vec<T>>, dataset: Dataset) -> Result<&T> {
    table(slot, dataset)?
        .first()
        .ok_or(DashboardError::MissingRow { dataset, row: 0 })
}

/// Read one CSV file into typed rows, validating the header first
pub fn read_table<T: TableRecord>(path: &Path) -> Result<Vec<T>> {
    let dataset = T::DATASET;
    let raw = std::fs::read_to_string(path).map_err(|source| DashboardError::Io {
        dataset,
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&raw)
}

/// Parse CSV text into typed rows
pub fn parse_table<T: TableRecord>(raw: &str) -> Result<Vec<T>> {
    let dataset = T::DATASET;
    // Exports from spreadsheet tools lead with a byte-order mark
    let content = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| DashboardError::Csv { dataset, source })?
        .clone();
    for &column in T::COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DashboardError::MissingColumn { dataset, column });
        }
    }

    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    for result in reader.deserialize::<T>() {
        let row = result.map_err(|source| DashboardError::Csv { dataset, source })?;
        if let Some(key) = row.key() {
            if !seen.insert(key.clone()) {
                return Err(DashboardError::DuplicateKey { dataset, key });
            }
        }
        rows.push(row);
    }

    debug!(dataset = %dataset, rows = rows.len(), "loaded dataset");
    Ok(rows)
}
