use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Weekday column order for both grid variants (Monday-first).
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Hour range covered by the weekly grid, inclusive.
pub const FIRST_HOUR: u32 = 6;
pub const LAST_HOUR: u32 = 18;

/// Availability of one grid cell. Every cell holds exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityState {
    Available,
    NotAvailable,
    IfRequired,
    OutOfCam,
}

impl AvailabilityState {
    pub const ALL: [AvailabilityState; 4] = [
        AvailabilityState::Available,
        AvailabilityState::NotAvailable,
        AvailabilityState::IfRequired,
        AvailabilityState::OutOfCam,
    ];

    /// CSS class projected onto the cell. Also the wire spelling in
    /// `times` tokens and the existing-data lists.
    pub fn css_class(&self) -> &'static str {
        match self {
            AvailabilityState::Available => "available",
            AvailabilityState::NotAvailable => "not-available",
            AvailabilityState::IfRequired => "if-required",
            AvailabilityState::OutOfCam => "out-of-cam",
        }
    }

    /// Button caption for the mode picker.
    pub fn label(&self) -> &'static str {
        match self {
            AvailabilityState::Available => "Available",
            AvailabilityState::NotAvailable => "Not available",
            AvailabilityState::IfRequired => "If required",
            AvailabilityState::OutOfCam => "Out of Cam",
        }
    }

    pub fn parse(value: &str) -> Result<Self, StateParseError> {
        match value {
            "available" => Ok(AvailabilityState::Available),
            "not-available" => Ok(AvailabilityState::NotAvailable),
            "if-required" => Ok(AvailabilityState::IfRequired),
            "out-of-cam" => Ok(AvailabilityState::OutOfCam),
            other => Err(StateParseError(other.to_string())),
        }
    }
}

impl fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.css_class())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateParseError(pub String);

impl fmt::Display for StateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown availability state: {}", self.0)
    }
}

impl std::error::Error for StateParseError {}

/// Per-state date-key lists delivered by the server at page load.
///
/// Absent keys and a fully empty object both mean "no saved data": every
/// cell then defaults to `available`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingAvailability {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
    #[serde(default, rename = "not-available", skip_serializing_if = "Vec::is_empty")]
    pub not_available: Vec<String>,
    #[serde(default, rename = "if-required", skip_serializing_if = "Vec::is_empty")]
    pub if_required: Vec<String>,
    #[serde(default, rename = "out-of-cam", skip_serializing_if = "Vec::is_empty")]
    pub out_of_cam: Vec<String>,
}

impl ExistingAvailability {
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
            && self.not_available.is_empty()
            && self.if_required.is_empty()
            && self.out_of_cam.is_empty()
    }

    /// Saved state for a date-key. First matching list wins, in the order
    /// available, not-available, if-required, out-of-cam; unknown keys are
    /// `available`.
    pub fn state_for(&self, date_key: &str) -> AvailabilityState {
        if self.available.iter().any(|d| d == date_key) {
            AvailabilityState::Available
        } else if self.not_available.iter().any(|d| d == date_key) {
            AvailabilityState::NotAvailable
        } else if self.if_required.iter().any(|d| d == date_key) {
            AvailabilityState::IfRequired
        } else if self.out_of_cam.iter().any(|d| d == date_key) {
            AvailabilityState::OutOfCam
        } else {
            AvailabilityState::Available
        }
    }
}

/// Race and event days keyed by date-key, each with a descriptive text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayMarkers {
    #[serde(default)]
    pub race_days: BTreeMap<String, String>,
    #[serde(default)]
    pub event_days: BTreeMap<String, String>,
}

impl DayMarkers {
    /// Marker for a date-key, if any. A day that is both a race and an
    /// event day gets the combined kind and both texts in the tooltip.
    pub fn marker_for(&self, date_key: &str) -> Option<DayMarker> {
        match (self.race_days.get(date_key), self.event_days.get(date_key)) {
            (Some(race), Some(event)) => Some(DayMarker {
                kind: MarkerKind::RaceAndEvent,
                tooltip: format!("{}\n{}", race, event),
            }),
            (Some(race), None) => Some(DayMarker {
                kind: MarkerKind::Race,
                tooltip: race.clone(),
            }),
            (None, Some(event)) => Some(DayMarker {
                kind: MarkerKind::Event,
                tooltip: event.clone(),
            }),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Race,
    Event,
    RaceAndEvent,
}

impl MarkerKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            MarkerKind::Race => "race-day",
            MarkerKind::Event => "event-day",
            MarkerKind::RaceAndEvent => "race-event-day",
        }
    }

    /// Race-marked cells redirect to the races page on press instead of
    /// painting.
    pub fn navigates(&self) -> bool {
        matches!(self, MarkerKind::Race | MarkerKind::RaceAndEvent)
    }
}

/// A marked day: visual tag plus tooltip text. Marked cells are never
/// paintable.
#[derive(Debug, Clone, PartialEq)]
pub struct DayMarker {
    pub kind: MarkerKind,
    pub tooltip: String,
}

/// The period a grid is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRef {
    Month { month: u32, year: i32 },
    Week { start: NaiveDate },
}

impl PeriodRef {
    /// Period field of the submission payload: the month number as the
    /// selector sends it, or the week start as `DD/MM/YYYY`.
    pub fn payload_field(&self) -> PeriodField {
        match self {
            PeriodRef::Month { month, .. } => PeriodField::Month(month.to_string()),
            PeriodRef::Week { start } => {
                PeriodField::WeekStart(start.format("%d/%m/%Y").to_string())
            }
        }
    }
}

/// One slot of the rendered grid body.
#[derive(Debug, Clone, PartialEq)]
pub enum GridSlot {
    /// Non-interactive filler for days outside the period.
    Filler,
    Cell(GridCell),
}

/// A selectable cell: stable date-key, display label, optional marker.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub date_key: String,
    pub label: String,
    pub marker: Option<DayMarker>,
}

impl GridCell {
    pub fn is_paintable(&self) -> bool {
        self.marker.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    InvalidMonth { month: u32, year: i32 },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::InvalidMonth { month, year } => {
                write!(f, "Invalid month {}/{}", month, year)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Cell structure for one rendered period.
///
/// A layout is a pure value: switching periods builds a fresh one, so stale
/// cells can never leak between renders. Rows and columns address the 7-wide
/// body grid and are what rectangle selection operates on.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub period: PeriodRef,
    /// Column captions: weekday names for a month, `Mon 02/06` for a week.
    pub col_headers: Vec<String>,
    /// Row captions: empty for a month, `06:00`-style hours for a week.
    pub row_headers: Vec<String>,
    rows: Vec<Vec<GridSlot>>,
}

impl GridLayout {
    /// Month calendar: Monday-first columns, one row per week, leading and
    /// trailing slots outside the month rendered as filler. Date-keys are
    /// `YYYYMMDD`.
    pub fn month(year: i32, month: u32, markers: &DayMarkers) -> Result<Self, LayoutError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(LayoutError::InvalidMonth { month, year })?;
        let total_days = days_in_month(year, month);
        // chrono already numbers Monday as 0, which folds the Sunday=0
        // convention into the offset we need.
        let start_offset = first.weekday().num_days_from_monday() as usize;
        let weeks = (total_days as usize + start_offset + 6) / 7;

        let mut rows = Vec::with_capacity(weeks);
        let mut day = 1u32;
        for week in 0..weeks {
            let mut row = Vec::with_capacity(7);
            for col in 0..7 {
                if (week == 0 && col < start_offset) || day > total_days {
                    row.push(GridSlot::Filler);
                } else {
                    let date_key = format!("{:04}{:02}{:02}", year, month, day);
                    row.push(GridSlot::Cell(GridCell {
                        marker: markers.marker_for(&date_key),
                        label: day.to_string(),
                        date_key,
                    }));
                    day += 1;
                }
            }
            rows.push(row);
        }

        Ok(Self {
            period: PeriodRef::Month { month, year },
            col_headers: WEEKDAYS.iter().map(|d| d.to_string()).collect(),
            row_headers: Vec::new(),
            rows,
        })
    }

    /// Weekly hour grid: one row per hour from `FIRST_HOUR` to `LAST_HOUR`,
    /// seven day columns anchored at `start`. Date-keys are
    /// `YYYY-MM-DD-HH:MM`.
    pub fn week(start: NaiveDate) -> Self {
        let mut col_headers = Vec::with_capacity(7);
        for (i, name) in WEEKDAYS.iter().enumerate() {
            let day = start + Duration::days(i as i64);
            col_headers.push(format!("{} {:02}/{:02}", &name[..3], day.day(), day.month()));
        }

        let row_headers: Vec<String> = (FIRST_HOUR..=LAST_HOUR)
            .map(|hour| format!("{:02}:00", hour))
            .collect();

        let mut rows = Vec::with_capacity(row_headers.len());
        for hour in FIRST_HOUR..=LAST_HOUR {
            let mut row = Vec::with_capacity(7);
            for i in 0..7 {
                let day = start + Duration::days(i as i64);
                row.push(GridSlot::Cell(GridCell {
                    date_key: format!("{}-{:02}:00", day.format("%Y-%m-%d"), hour),
                    label: format!("{:02}:00", hour),
                    marker: None,
                }));
            }
            rows.push(row);
        }

        Self {
            period: PeriodRef::Week { start },
            col_headers,
            row_headers,
            rows,
        }
    }

    pub fn rows(&self) -> &[Vec<GridSlot>] {
        &self.rows
    }

    /// Selectable cell at a body position; `None` for filler or out of
    /// bounds.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&GridCell> {
        match self.rows.get(row)?.get(col)? {
            GridSlot::Cell(cell) => Some(cell),
            GridSlot::Filler => None,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.rows.iter().flatten().filter_map(|slot| match slot {
            GridSlot::Cell(cell) => Some(cell),
            GridSlot::Filler => None,
        })
    }
}

/// Number of days in a month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// What a press on a grid position resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// A gesture started and the cell was painted.
    Painted,
    /// The cell carries a race marker; the caller should navigate to the
    /// races page instead.
    Navigate,
    /// Filler, out of bounds, or an event-marked cell.
    Ignored,
}

/// One continuous press-drag-release interaction.
#[derive(Debug, Clone, PartialEq)]
struct Gesture {
    anchor: (usize, usize),
    /// Date-keys already painted during this gesture; rectangle recomputation
    /// skips them until release.
    locked: HashSet<String>,
}

/// Pending availability for one rendered period.
///
/// Owns the selection buffer, the notes map, the widget-wide paint mode, and
/// the in-flight gesture. The buffer is the single source of truth; cell
/// classes in the DOM are a projection of it and are never read back.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityModel {
    states: BTreeMap<String, AvailabilityState>,
    notes: BTreeMap<String, String>,
    mode: AvailabilityState,
    gesture: Option<Gesture>,
    saved_states: BTreeMap<String, AvailabilityState>,
    saved_notes: BTreeMap<String, String>,
}

impl AvailabilityModel {
    /// Builds the buffer for a freshly rendered layout: every cell gets its
    /// saved state (default `available`), notes are kept for cells that
    /// exist in the layout, and the result doubles as the clean snapshot for
    /// dirty tracking.
    pub fn new(
        layout: &GridLayout,
        existing: &ExistingAvailability,
        notes: &BTreeMap<String, String>,
    ) -> Self {
        let mut states = BTreeMap::new();
        let mut kept_notes = BTreeMap::new();
        for cell in layout.cells() {
            states.insert(cell.date_key.clone(), existing.state_for(&cell.date_key));
            if let Some(text) = notes.get(&cell.date_key) {
                if !text.is_empty() {
                    kept_notes.insert(cell.date_key.clone(), text.clone());
                }
            }
        }
        Self {
            saved_states: states.clone(),
            saved_notes: kept_notes.clone(),
            states,
            notes: kept_notes,
            mode: AvailabilityState::Available,
            gesture: None,
        }
    }

    pub fn mode(&self) -> AvailabilityState {
        self.mode
    }

    /// Changes the mode applied by subsequent gestures. Never repaints
    /// existing cells.
    pub fn set_mode(&mut self, mode: AvailabilityState) {
        self.mode = mode;
    }

    pub fn state_of(&self, date_key: &str) -> Option<AvailabilityState> {
        self.states.get(date_key).copied()
    }

    pub fn note_of(&self, date_key: &str) -> &str {
        self.notes.get(date_key).map(String::as_str).unwrap_or("")
    }

    pub fn set_note(&mut self, date_key: &str, text: String) {
        if text.is_empty() {
            self.notes.remove(date_key);
        } else {
            self.notes.insert(date_key.to_string(), text);
        }
    }

    pub fn is_painting(&self) -> bool {
        self.gesture.is_some()
    }

    /// Pointer-down over a body position. Starts a gesture anchored there and
    /// paints the cell as a single-cell rectangle, unless the cell is marked
    /// or filler.
    pub fn press(&mut self, layout: &GridLayout, row: usize, col: usize) -> PressOutcome {
        let cell = match layout.cell_at(row, col) {
            Some(cell) => cell,
            None => return PressOutcome::Ignored,
        };
        if let Some(marker) = &cell.marker {
            if marker.kind.navigates() {
                return PressOutcome::Navigate;
            }
            return PressOutcome::Ignored;
        }

        let date_key = cell.date_key.clone();
        self.apply_mode(&date_key);
        let mut locked = HashSet::new();
        locked.insert(date_key);
        self.gesture = Some(Gesture {
            anchor: (row, col),
            locked,
        });
        PressOutcome::Painted
    }

    /// Pointer movement while painting. Recomputes the inclusive rectangle
    /// between the anchor and the hovered cell and paints every paintable,
    /// unlocked cell in it. Movement over filler, marked, or already-locked
    /// cells changes nothing.
    pub fn drag_to(&mut self, layout: &GridLayout, row: usize, col: usize) {
        let anchor = match &self.gesture {
            Some(gesture) => gesture.anchor,
            None => return,
        };
        match layout.cell_at(row, col) {
            Some(cell) if cell.is_paintable() && !self.is_locked(&cell.date_key) => {}
            _ => return,
        }

        let (min_row, max_row) = (anchor.0.min(row), anchor.0.max(row));
        let (min_col, max_col) = (anchor.1.min(col), anchor.1.max(col));
        for r in min_row..=max_row {
            for c in min_col..=max_col {
                let date_key = match layout.cell_at(r, c) {
                    Some(cell) if cell.is_paintable() => cell.date_key.clone(),
                    _ => continue,
                };
                if self.is_locked(&date_key) {
                    continue;
                }
                self.apply_mode(&date_key);
                if let Some(gesture) = &mut self.gesture {
                    gesture.locked.insert(date_key);
                }
            }
        }
    }

    /// Pointer-up anywhere in the document: ends the gesture and drops its
    /// lock set.
    pub fn release(&mut self) {
        self.gesture = None;
    }

    /// Whether the buffer or notes differ from the snapshot taken at
    /// initialization. Drives the unsaved-changes unload guard.
    pub fn is_dirty(&self) -> bool {
        self.states != self.saved_states || self.notes != self.saved_notes
    }

    /// Serializes the buffer for submission: one `<date-key>|<state>` token
    /// per entry in buffer order, plus trimmed non-empty notes for buffered
    /// keys.
    pub fn payload(&self, name: &str, period: &PeriodRef) -> AvailabilityPayload {
        let times = self
            .states
            .iter()
            .map(|(date_key, state)| format!("{}|{}", date_key, state))
            .collect();
        let mut notes = BTreeMap::new();
        for date_key in self.states.keys() {
            let text = self.note_of(date_key).trim();
            if !text.is_empty() {
                notes.insert(date_key.clone(), text.to_string());
            }
        }
        AvailabilityPayload {
            name: name.to_string(),
            period: period.payload_field(),
            times,
            notes,
        }
    }

    fn is_locked(&self, date_key: &str) -> bool {
        self.gesture
            .as_ref()
            .map(|gesture| gesture.locked.contains(date_key))
            .unwrap_or(false)
    }

    fn apply_mode(&mut self, date_key: &str) {
        // No-op when the cell already holds the mode state, so an unchanged
        // cell causes no buffer churn.
        match self.states.get(date_key) {
            Some(state) if *state == self.mode => {}
            Some(_) => {
                self.states.insert(date_key.to_string(), self.mode);
            }
            None => {}
        }
    }
}

/// JSON body POSTed to the availability endpoint on submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityPayload {
    pub name: String,
    #[serde(flatten)]
    pub period: PeriodField,
    pub times: Vec<String>,
    pub notes: BTreeMap<String, String>,
}

/// Period reference as it appears on the wire: `"month"` or `"weekStart"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PeriodField {
    #[serde(rename = "month")]
    Month(String),
    #[serde(rename = "weekStart")]
    WeekStart(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn january() -> GridLayout {
        // January 2025 starts on a Wednesday.
        GridLayout::month(2025, 1, &DayMarkers::default()).unwrap()
    }

    fn two_cell_layout() -> GridLayout {
        GridLayout {
            period: PeriodRef::Month { month: 1, year: 2025 },
            col_headers: Vec::new(),
            row_headers: Vec::new(),
            rows: vec![vec![
                GridSlot::Cell(GridCell {
                    date_key: "A".to_string(),
                    label: "A".to_string(),
                    marker: None,
                }),
                GridSlot::Cell(GridCell {
                    date_key: "B".to_string(),
                    label: "B".to_string(),
                    marker: None,
                }),
            ]],
        }
    }

    #[test]
    fn test_state_css_classes_and_parse() {
        for state in AvailabilityState::ALL {
            assert_eq!(AvailabilityState::parse(state.css_class()).unwrap(), state);
            assert_eq!(state.to_string(), state.css_class());
        }
        assert!(AvailabilityState::parse("busy").is_err());
    }

    #[test]
    fn test_state_serde_spelling() {
        let json = serde_json::to_string(&AvailabilityState::NotAvailable).unwrap();
        assert_eq!(json, "\"not-available\"");
        let parsed: AvailabilityState = serde_json::from_str("\"out-of-cam\"").unwrap();
        assert_eq!(parsed, AvailabilityState::OutOfCam);
    }

    #[test]
    fn test_existing_data_missing_keys_default() {
        let existing: ExistingAvailability =
            serde_json::from_str(r#"{"not-available": ["20250103"]}"#).unwrap();
        assert!(existing.available.is_empty());
        assert_eq!(existing.not_available, vec!["20250103".to_string()]);
        assert!(!existing.is_empty());

        let empty: ExistingAvailability = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_state_for_precedence() {
        let existing = ExistingAvailability {
            available: vec!["20250101".to_string()],
            not_available: vec!["20250101".to_string(), "20250102".to_string()],
            if_required: vec!["20250103".to_string()],
            out_of_cam: vec!["20250104".to_string()],
        };
        assert_eq!(existing.state_for("20250101"), AvailabilityState::Available);
        assert_eq!(existing.state_for("20250102"), AvailabilityState::NotAvailable);
        assert_eq!(existing.state_for("20250103"), AvailabilityState::IfRequired);
        assert_eq!(existing.state_for("20250104"), AvailabilityState::OutOfCam);
        assert_eq!(existing.state_for("20250199"), AvailabilityState::Available);
    }

    #[test]
    fn test_month_layout_padding() {
        let layout = january();
        // Wednesday start: exactly two leading filler slots.
        assert_eq!(layout.rows()[0][0], GridSlot::Filler);
        assert_eq!(layout.rows()[0][1], GridSlot::Filler);
        let first = layout.cell_at(0, 2).unwrap();
        assert_eq!(first.date_key, "20250101");
        assert_eq!(first.label, "1");
        // ceil((31 + 2) / 7) = 5 week rows, trailing slots filled.
        assert_eq!(layout.rows().len(), 5);
        assert_eq!(layout.cell_at(4, 4).unwrap().date_key, "20250131");
        assert_eq!(layout.rows()[4][5], GridSlot::Filler);
        assert_eq!(layout.rows()[4][6], GridSlot::Filler);
        assert_eq!(layout.cells().count(), 31);
    }

    #[test]
    fn test_week_layout_keys_and_headers() {
        // 2025-06-02 is a Monday.
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let layout = GridLayout::week(start);
        assert_eq!(layout.rows().len(), 13);
        assert_eq!(layout.row_headers.first().unwrap(), "06:00");
        assert_eq!(layout.row_headers.last().unwrap(), "18:00");
        assert_eq!(layout.col_headers[0], "Mon 02/06");
        assert_eq!(layout.col_headers[6], "Sun 08/06");
        assert_eq!(layout.cell_at(0, 0).unwrap().date_key, "2025-06-02-06:00");
        assert_eq!(layout.cell_at(12, 6).unwrap().date_key, "2025-06-08-18:00");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 1), 31);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
    }

    #[test]
    fn test_is_leap_year() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
    }

    #[test]
    fn test_initialization_assigns_exactly_one_state() {
        let layout = january();
        let existing = ExistingAvailability {
            not_available: vec!["20250103".to_string()],
            ..ExistingAvailability::default()
        };
        let model = AvailabilityModel::new(&layout, &existing, &BTreeMap::new());
        for cell in layout.cells() {
            let state = model.state_of(&cell.date_key);
            assert!(state.is_some(), "cell {} has no state", cell.date_key);
        }
        assert_eq!(model.state_of("20250103"), Some(AvailabilityState::NotAvailable));
        assert_eq!(model.state_of("20250104"), Some(AvailabilityState::Available));
        assert!(!model.is_dirty());
    }

    #[test]
    fn test_empty_existing_defaults_to_available() {
        let layout = january();
        let model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        assert!(layout
            .cells()
            .all(|cell| model.state_of(&cell.date_key) == Some(AvailabilityState::Available)));
    }

    #[test]
    fn test_painting_current_state_is_noop() {
        let layout = january();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        let before = model.clone();
        // Mode defaults to available and every cell already is.
        assert_eq!(model.press(&layout, 0, 2), PressOutcome::Painted);
        model.release();
        assert_eq!(model.state_of("20250101"), before.state_of("20250101"));
        assert!(!model.is_dirty());
    }

    #[test]
    fn test_rectangle_paint() {
        let layout = january();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        model.set_mode(AvailabilityState::NotAvailable);
        // Anchor on day 16 (row 2, col 3), drag up-left to day 7 (row 1,
        // col 1): the rectangle covers days 7-9 and 14-16.
        assert_eq!(model.press(&layout, 2, 3), PressOutcome::Painted);
        model.drag_to(&layout, 1, 1);
        model.release();

        for day in ["20250107", "20250108", "20250109", "20250114", "20250115", "20250116"] {
            assert_eq!(model.state_of(day), Some(AvailabilityState::NotAvailable), "{}", day);
        }
        // Outside the rectangle: untouched.
        assert_eq!(model.state_of("20250106"), Some(AvailabilityState::Available));
        assert_eq!(model.state_of("20250110"), Some(AvailabilityState::Available));
        assert_eq!(model.state_of("20250113"), Some(AvailabilityState::Available));
    }

    #[test]
    fn test_lock_set_skips_visited_cells_within_gesture() {
        let layout = january();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        model.set_mode(AvailabilityState::NotAvailable);
        // Paint days 6-8 on row 1, locking them for the gesture.
        assert_eq!(model.press(&layout, 1, 0), PressOutcome::Painted);
        model.drag_to(&layout, 1, 2);
        // A mid-gesture mode change must not repaint locked cells.
        model.set_mode(AvailabilityState::IfRequired);
        model.drag_to(&layout, 1, 3);
        for day in ["20250106", "20250107", "20250108"] {
            assert_eq!(model.state_of(day), Some(AvailabilityState::NotAvailable), "{}", day);
        }
        assert_eq!(model.state_of("20250109"), Some(AvailabilityState::IfRequired));

        // Release clears the lock set; the next gesture repaints freely.
        model.release();
        assert!(!model.is_painting());
        assert_eq!(model.press(&layout, 1, 1), PressOutcome::Painted);
        model.release();
        assert_eq!(model.state_of("20250107"), Some(AvailabilityState::IfRequired));
    }

    #[test]
    fn test_drag_without_gesture_is_ignored() {
        let layout = january();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        model.set_mode(AvailabilityState::OutOfCam);
        model.drag_to(&layout, 1, 1);
        assert_eq!(model.state_of("20250107"), Some(AvailabilityState::Available));
    }

    #[test]
    fn test_press_on_filler_is_ignored() {
        let layout = january();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        assert_eq!(model.press(&layout, 0, 0), PressOutcome::Ignored);
        assert!(!model.is_painting());
    }

    #[test]
    fn test_marked_cells() {
        let mut markers = DayMarkers::default();
        markers
            .race_days
            .insert("20250104".to_string(), "Fairbairns".to_string());
        markers
            .event_days
            .insert("20250104".to_string(), "Club dinner".to_string());
        markers
            .event_days
            .insert("20250105".to_string(), "Erg test".to_string());

        let combined = markers.marker_for("20250104").unwrap();
        assert_eq!(combined.kind, MarkerKind::RaceAndEvent);
        assert_eq!(combined.tooltip, "Fairbairns\nClub dinner");
        assert!(combined.kind.navigates());
        let event = markers.marker_for("20250105").unwrap();
        assert_eq!(event.kind, MarkerKind::Event);
        assert!(!event.kind.navigates());
        assert!(markers.marker_for("20250106").is_none());

        let layout = GridLayout::month(2025, 1, &markers).unwrap();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        model.set_mode(AvailabilityState::NotAvailable);
        // Race day press navigates, event day press is inert.
        assert_eq!(model.press(&layout, 0, 5), PressOutcome::Navigate);
        assert_eq!(model.press(&layout, 0, 6), PressOutcome::Ignored);
        // Rectangle over days 3-5 and 10-12 skips both marked cells.
        assert_eq!(model.press(&layout, 0, 4), PressOutcome::Painted);
        model.drag_to(&layout, 1, 6);
        model.release();
        assert_eq!(model.state_of("20250103"), Some(AvailabilityState::NotAvailable));
        assert_eq!(model.state_of("20250104"), Some(AvailabilityState::Available));
        assert_eq!(model.state_of("20250105"), Some(AvailabilityState::Available));
        for day in ["20250110", "20250111", "20250112"] {
            assert_eq!(model.state_of(day), Some(AvailabilityState::NotAvailable), "{}", day);
        }
    }

    #[test]
    fn test_mode_switch_does_not_repaint() {
        let layout = january();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        model.set_mode(AvailabilityState::OutOfCam);
        assert!(layout
            .cells()
            .all(|cell| model.state_of(&cell.date_key) == Some(AvailabilityState::Available)));
        assert!(!model.is_dirty());
    }

    #[test]
    fn test_payload_round_trip() {
        let layout = two_cell_layout();
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        model.set_mode(AvailabilityState::NotAvailable);
        assert_eq!(model.press(&layout, 0, 1), PressOutcome::Painted);
        model.release();
        model.set_note("A", "  back soon  ".to_string());
        model.set_note("B", "   ".to_string());

        let payload = model.payload("jd123", &PeriodRef::Month { month: 1, year: 2025 });
        assert_eq!(
            payload.times,
            vec!["A|available".to_string(), "B|not-available".to_string()]
        );
        assert_eq!(payload.notes.len(), 1);
        assert_eq!(payload.notes.get("A").unwrap(), "back soon");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["name"], "jd123");
        assert_eq!(json["month"], "1");
        assert_eq!(json["times"][0], "A|available");
        assert_eq!(json["notes"]["A"], "back soon");
        assert!(json.get("weekStart").is_none());
    }

    #[test]
    fn test_payload_week_period_field() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let layout = GridLayout::week(start);
        let model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &BTreeMap::new());
        let payload = model.payload("jd123", &layout.period);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["weekStart"], "02/06/2025");
        assert!(json.get("month").is_none());
        assert_eq!(payload.times.len(), 13 * 7);
    }

    #[test]
    fn test_dirty_tracking() {
        let layout = january();
        let mut notes = BTreeMap::new();
        notes.insert("20250102".to_string(), "late outing".to_string());
        let mut model =
            AvailabilityModel::new(&layout, &ExistingAvailability::default(), &notes);
        assert!(!model.is_dirty());
        assert_eq!(model.note_of("20250102"), "late outing");

        model.set_mode(AvailabilityState::IfRequired);
        assert_eq!(model.press(&layout, 0, 2), PressOutcome::Painted);
        model.release();
        assert!(model.is_dirty());

        // A fresh model from the same inputs is clean again.
        let reset = AvailabilityModel::new(&layout, &ExistingAvailability::default(), &notes);
        assert!(!reset.is_dirty());

        let mut noted = reset.clone();
        noted.set_note("20250110", "captain's decision".to_string());
        assert!(noted.is_dirty());
        noted.set_note("20250110", String::new());
        assert!(!noted.is_dirty());
    }
}
