//! Named datasets and their on-disk file names

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One logical table the dashboard reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Realtime,
    DailyVitals,
    WeeklyVitals,
    SleepSummary,
    MonthlySleep,
    Movement,
    Distance,
    RoomTransitions,
    Falls,
    Anomalies,
    StaffVitals,
    ActivityStates,
    CareEvents,
    HealthScores,
    PlaceShares,
}

impl Dataset {
    pub const ALL: [Dataset; 15] = [
        Dataset::Realtime,
        Dataset::DailyVitals,
        Dataset::WeeklyVitals,
        Dataset::SleepSummary,
        Dataset::MonthlySleep,
        Dataset::Movement,
        Dataset::Distance,
        Dataset::RoomTransitions,
        Dataset::Falls,
        Dataset::Anomalies,
        Dataset::StaffVitals,
        Dataset::ActivityStates,
        Dataset::CareEvents,
        Dataset::HealthScores,
        Dataset::PlaceShares,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Realtime => "realtime",
            Dataset::DailyVitals => "daily_vitals",
            Dataset::WeeklyVitals => "weekly_vitals",
            Dataset::SleepSummary => "sleep_summary",
            Dataset::MonthlySleep => "monthly_sleep",
            Dataset::Movement => "movement",
            Dataset::Distance => "distance",
            Dataset::RoomTransitions => "room_transitions",
            Dataset::Falls => "falls",
            Dataset::Anomalies => "anomalies",
            Dataset::StaffVitals => "staff_vitals",
            Dataset::ActivityStates => "activity_states",
            Dataset::CareEvents => "care_events",
            Dataset::HealthScores => "health_scores",
            Dataset::PlaceShares => "place_shares",
        }
    }

    /// File name used when the configuration does not override it
    pub fn default_file(&self) -> &'static str {
        match self {
            Dataset::Realtime => "realtime.csv",
            Dataset::DailyVitals => "todayheart.csv",
            Dataset::WeeklyVitals => "todayheartmax.csv",
            Dataset::SleepSummary => "active.csv",
            Dataset::MonthlySleep => "sleep.csv",
            Dataset::Movement => "move.csv",
            Dataset::Distance => "todaymove.csv",
            Dataset::RoomTransitions => "room.csv",
            Dataset::Falls => "fall.csv",
            Dataset::Anomalies => "log.csv",
            Dataset::StaffVitals => "staff.csv",
            Dataset::ActivityStates => "timeline.csv",
            Dataset::CareEvents => "events.csv",
            Dataset::HealthScores => "score.csv",
            Dataset::PlaceShares => "places.csv",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps each dataset to the file it is read from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetFiles {
    overrides: BTreeMap<Dataset, String>,
}

impl DatasetFiles {
    pub fn with_overrides(overrides: BTreeMap<Dataset, String>) -> Self {
        DatasetFiles { overrides }
    }

    pub fn file_name(&self, dataset: Dataset) -> &str {
        self.overrides
            .get(&dataset)
            .map(String::as_str)
            .unwrap_or_else(|| dataset.default_file())
    }

    pub fn path(&self, data_dir: &Path, dataset: Dataset) -> PathBuf {
        data_dir.join(self.file_name(dataset))
    }

    pub fn overrides(&self) -> &BTreeMap<Dataset, String> {
        &self.overrides
    }
}
