//! Page composition
//!
//! Each page is a fixed list of panels. A panel is a colored header over a
//! sequence of blocks; blocks are filled from the `DataStore` and then
//! rendered to HTML in order.

use crate::chart::Figure;
use crate::config::ResolvedConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::figures::FigureKind;
use crate::html::{self, ChangeStyle};
use crate::records::AnomalyEvent;
use crate::store::DataStore;
use crate::transform::{relative_change, Computed};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// A dashboard page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Overview of one resident for facility staff
    Home,
    /// Staff view with day-over-day change arrows
    Staff,
    /// Simplified view for family members
    Family,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::Staff, Page::Family];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Staff => "staff",
            Page::Family => "family",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Health Dashboard",
            Page::Staff => "Health Dashboard (Staff)",
            Page::Family => "Health Dashboard (Family)",
        }
    }

    /// Datasets the page reads; nothing else is loaded for it
    pub fn datasets(&self) -> &'static [Dataset] {
        match self {
            Page::Home => &[
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
            ],
            Page::Staff => &[
                Dataset::StaffVitals,
                Dataset::DailyVitals,
                Dataset::WeeklyVitals,
                Dataset::SleepSummary,
                Dataset::MonthlySleep,
                Dataset::Movement,
                Dataset::Distance,
                Dataset::RoomTransitions,
                Dataset::Falls,
                Dataset::Anomalies,
            ],
            Page::Family => &[
                Dataset::Realtime,
                Dataset::SleepSummary,
                Dataset::MonthlySleep,
                Dataset::ActivityStates,
                Dataset::CareEvents,
                Dataset::HealthScores,
                Dataset::PlaceShares,
            ],
        }
    }

    /// Load this page's datasets and render it
    pub fn load_and_render(&self, config: &ResolvedConfig) -> Result<String> {
        let store = DataStore::load(&config.data_dir, &config.files, self.datasets())?;
        render_page(*self, &store, config)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Page::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown page: {} (expected home, staff or family)", s))
    }
}

/// A titled panel of blocks
pub struct Section<'a> {
    pub title: &'static str,
    pub color: &'static str,
    pub blocks: Vec<Block<'a>>,
}

/// One renderable unit inside a panel
pub enum Block<'a> {
    Caption(&'static str),
    Headline {
        value: String,
        unit: &'static str,
        change: Option<(Computed, ChangeStyle)>,
    },
    Duration(f64),
    Figure(FigureKind, Figure),
    AnomalyLog(&'a [AnomalyEvent]),
    Records {
        lines: Vec<String>,
        background: &'static str,
    },
    /// Blocks laid out side by side
    Row(Vec<Block<'a>>),
    /// Blocks stacked top to bottom inside one cell of a row
    Column(Vec<Block<'a>>),
}

impl Block<'_> {
    fn render(&self) -> String {
        match self {
            Block::Caption(text) => html::caption(text),
            Block::Headline {
                value,
                unit,
                change,
            } => {
                let badge = change.map(|(c, style)| html::change_badge(c, style));
                html::headline(value, unit, badge.as_deref())
            }
            Block::Duration(hours) => html::duration_headline(*hours),
            Block::Figure(kind, figure) => html::figure_embed(&kind.element_id(), figure),
            Block::AnomalyLog(events) => html::anomaly_table(events),
            Block::Records { lines, background } => html::record_list(lines, background),
            Block::Row(blocks) => {
                let cells: String = blocks
                    .iter()
                    .map(|b| format!("<div>{}</div>", b.render()))
                    .collect();
                format!(r#"<div class="row">{}</div>"#, cells)
            }
            Block::Column(blocks) => {
                let cells: String = blocks.iter().map(|b| b.render()).collect();
                format!(r#"<div class="column">{}</div>"#, cells)
            }
        }
    }
}

impl Section<'_> {
    fn render(&self) -> String {
        let blocks: String = self.blocks.iter().map(|b| b.render()).collect();
        format!(
            r#"<section class="panel">
{header}
{blocks}
</section>"#,
            header = html::panel_header(self.title, self.color),
            blocks = blocks,
        )
    }
}

/// Render a complete page from an already-loaded store
pub fn render_page(page: Page, store: &DataStore, config: &ResolvedConfig) -> Result<String> {
    let sections = compose(page, store, config)?;
    let body: String = sections.iter().map(|s| s.render()).collect();
    info!(page = page.as_str(), sections = sections.len(), "rendered page");
    Ok(html::render_document(page.title(), &config.plotly_js, &body))
}

/// Fill the page's panels from the store
pub fn compose<'a>(
    page: Page,
    store: &'a DataStore,
    config: &ResolvedConfig,
) -> Result<Vec<Section<'a>>> {
    let figure = |kind: FigureKind| -> Result<Block<'a>> {
        Ok(Block::Figure(kind, kind.build(store, &config.chart)?))
    };

    match page {
        Page::Home | Page::Staff => {
            let vitals_row = match page {
                Page::Staff => {
                    let vitals = store.staff_vitals()?;
                    Block::Row(vec![
                        titled_headline(
                            "リアルタイムの心拍数",
                            vitals.heart_rate,
                            "",
                            Some((
                                relative_change(vitals.heart_rate, vitals.yesterday_heart_rate),
                                ChangeStyle::Arrow,
                            )),
                        ),
                        titled_headline(
                            "リアルタイムの呼吸数",
                            vitals.respiration_rate,
                            "",
                            Some((
                                relative_change(
                                    vitals.respiration_rate,
                                    vitals.yesterday_respiration_rate,
                                ),
                                ChangeStyle::Arrow,
                            )),
                        ),
                    ])
                }
                _ => Block::Row(vec![
                    titled_headline(
                        "リアルタイムの心拍数",
                        store.real_time_heart_rate()?,
                        "",
                        Some((store.heart_rate_change_ratio()?, ChangeStyle::Percent)),
                    ),
                    titled_headline(
                        "リアルタイムの呼吸数",
                        store.real_time_respiration_rate()?,
                        "",
                        Some((store.respiration_change_ratio()?, ChangeStyle::Percent)),
                    ),
                ]),
            };

            let movement = store.movement()?;
            let movement_row = match page {
                Page::Staff => Block::Row(vec![
                    titled_headline(
                        "本日の入退室数",
                        movement.room_entries,
                        "回",
                        Some((
                            relative_change(movement.room_entries, movement.yesterday_room_entries),
                            ChangeStyle::Arrow,
                        )),
                    ),
                    titled_headline("本日の移動距離", movement.distance, "m", None),
                ]),
                _ => Block::Row(vec![
                    titled_headline(
                        "本日の入退室数",
                        store.today_room_entries()?,
                        "回",
                        Some((store.room_entries_change_ratio()?, ChangeStyle::Percent)),
                    ),
                    titled_headline(
                        "本日の移動距離",
                        store.today_distance()?,
                        "m",
                        Some((store.distance_change_ratio()?, ChangeStyle::Percent)),
                    ),
                ]),
            };

            Ok(vec![
                Section {
                    title: "バイタル",
                    color: "#B45470",
                    blocks: vec![
                        vitals_row,
                        Block::Caption("1日の心拍数・呼吸数の推移"),
                        figure(FigureKind::DailyVitals)?,
                        Block::Caption("1週間の心拍数・呼吸数の推移"),
                        figure(FigureKind::WeeklyVitals)?,
                    ],
                },
                Section {
                    title: "睡眠・活動時間",
                    color: "#12728B",
                    blocks: vec![
                        Block::Row(vec![
                            Block::Column(vec![
                                Block::Caption("本日の起床時間"),
                                text_headline(store.today_wake_time()?),
                                Block::Caption("本日の就寝時間"),
                                text_headline(store.today_bed_time()?),
                            ]),
                            titled_block("睡眠時間・活動時間", figure(FigureKind::SleepComparison)?),
                        ]),
                        Block::Caption("一ヶ月の睡眠時間と活動時間の内訳"),
                        figure(FigureKind::SleepActivity)?,
                        Block::Caption("よく眠れている日、そうでない日の可視化"),
                        figure(FigureKind::SleepCalendar)?,
                    ],
                },
                Section {
                    title: "移動距離・入退室",
                    color: "#0BBCAE",
                    blocks: vec![
                        movement_row,
                        Block::Caption("本日の移動距離の内訳"),
                        figure(FigureKind::Distance)?,
                        Block::Caption("入退室の多い日・時刻"),
                        figure(FigureKind::RoomTransitions)?,
                    ],
                },
                Section {
                    title: "転倒・異常検知",
                    color: "#54B45E",
                    blocks: vec![Block::Row(vec![
                        titled_block("転倒検知した日、回数", figure(FigureKind::FallCalendar)?),
                        titled_block("異常検知ログ", Block::AnomalyLog(store.anomalies()?)),
                    ])],
                },
            ])
        }
        Page::Family => {
            let summary = store.sleep_summary()?;
            let care_lines: Vec<String> = store
                .care_events()?
                .iter()
                .map(|e| format!("{}　{}", e.time, e.description))
                .collect();

            Ok(vec![
                Section {
                    title: "本日のご様子",
                    color: "#EC8177",
                    blocks: vec![
                        Block::Row(vec![
                            titled_block("起床時間", text_headline(&summary.wake_time)),
                            titled_block("活動時間", Block::Duration(summary.active_hours)),
                        ]),
                        Block::Row(vec![
                            titled_block("現在の心拍数", figure(FigureKind::HeartRateGauge)?),
                            titled_block(
                                "本日の行動記録",
                                Block::Records {
                                    lines: care_lines,
                                    background: "#FCFFEA",
                                },
                            ),
                        ]),
                    ],
                },
                Section {
                    title: "睡眠、活動時間",
                    color: "#24BED4",
                    blocks: vec![
                        Block::Row(vec![
                            titled_block("就寝時間", text_headline(&summary.bed_time)),
                            titled_block("睡眠時間", Block::Duration(summary.sleep_hours)),
                        ]),
                        Block::Caption("睡眠時間、室内、室外（就寝：青、室内：水色、室外：オレンジ）"),
                        figure(FigureKind::ActivityStates)?,
                        Block::Caption("睡眠時間と活動時間の推移"),
                        figure(FigureKind::SleepActivity)?,
                    ],
                },
                Section {
                    title: "今月のご様子",
                    color: "#FCB917",
                    blocks: vec![
                        Block::Caption("健康スコア"),
                        figure(FigureKind::HealthRadar)?,
                        Block::Caption("施設内での過ごされ方"),
                        figure(FigureKind::PlaceDonut)?,
                        Block::Caption("今月の活動記録"),
                        figure(FigureKind::ActivityLog)?,
                    ],
                },
            ])
        }
    }
}

fn titled_block<'a>(title: &'static str, block: Block<'a>) -> Block<'a> {
    Block::Column(vec![Block::Caption(title), block])
}

fn titled_headline<'a>(
    title: &'static str,
    value: f64,
    unit: &'static str,
    change: Option<(Computed, ChangeStyle)>,
) -> Block<'a> {
    titled_block(
        title,
        Block::Headline {
            value: html::format_number(value),
            unit,
            change,
        },
    )
}

fn text_headline<'a>(value: &str) -> Block<'a> {
    Block::Headline {
        value: value.to_string(),
        unit: "",
        change: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_names_round_trip() {
        for page in Page::ALL {
            assert_eq!(page.as_str().parse::<Page>().unwrap(), page);
        }
        assert!("admin".parse::<Page>().is_err());
    }

    #[test]
    fn test_staff_page_reads_staff_vitals_not_realtime() {
        assert!(Page::Staff.datasets().contains(&Dataset::StaffVitals));
        assert!(!Page::Staff.datasets().contains(&Dataset::Realtime));
        assert!(Page::Home.datasets().contains(&Dataset::Realtime));
    }

    #[test]
    fn test_every_page_figure_dataset_is_declared() {
        // Each figure a page composes must come from a dataset the page loads
        let home = [
            FigureKind::DailyVitals,
            FigureKind::WeeklyVitals,
            FigureKind::SleepComparison,
            FigureKind::SleepActivity,
            FigureKind::SleepCalendar,
            FigureKind::Distance,
            FigureKind::RoomTransitions,
            FigureKind::FallCalendar,
        ];
        let family = [
            FigureKind::HeartRateGauge,
            FigureKind::ActivityStates,
            FigureKind::SleepActivity,
            FigureKind::HealthRadar,
            FigureKind::PlaceDonut,
            FigureKind::ActivityLog,
        ];
        for kind in home {
            assert!(Page::Home.datasets().contains(&kind.dataset()), "{kind}");
            assert!(Page::Staff.datasets().contains(&kind.dataset()), "{kind}");
        }
        for kind in family {
            assert!(Page::Family.datasets().contains(&kind.dataset()), "{kind}");
        }
    }

    #[test]
    fn test_empty_store_fails_with_data_not_found() {
        let store = DataStore::default();
        let config = ResolvedConfig::defaults().unwrap();
        for page in Page::ALL {
            let err = render_page(page, &store, &config).unwrap_err();
            assert!(err.is_data_not_found(), "{page}: {err}");
        }
    }

    #[test]
    fn test_row_renders_children_in_order() {
        let block = Block::Row(vec![Block::Caption("a"), Block::Caption("b")]);
        let html = block.render();
        let a = html.find(">a<").unwrap();
        let b = html.find(">b<").unwrap();
        assert!(html.starts_with(r#"<div class="row">"#));
        assert!(a < b);
    }
}
