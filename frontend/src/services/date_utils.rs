use chrono::{Datelike, NaiveDate};

/// Month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January", 2 => "February", 3 => "March", 4 => "April",
        5 => "May", 6 => "June", 7 => "July", 8 => "August",
        9 => "September", 10 => "October", 11 => "November", 12 => "December",
        _ => "January",
    }
}

/// Current year from the browser clock.
pub fn current_year() -> i32 {
    js_sys::Date::new_0().get_full_year() as i32
}

/// Current 1-based month from the browser clock.
pub fn current_month() -> u32 {
    // JavaScript months are 0-indexed
    js_sys::Date::new_0().get_month() + 1
}

/// Current date from the browser clock.
pub fn current_date() -> NaiveDate {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .unwrap_or_default()
}

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Parses a week selector value (`DD/MM/YYYY`). `None` means the value is
/// unusable and the caller should change nothing.
pub fn parse_week_start(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").ok()
}
