//! Clock and date strings for the face.
//!
//! All formatting is manual into bounded strings; chrono supplies the
//! calendar math only. Shapes match what the face draws: `H:MM` / `HH:MM`
//! time, two-digit seconds, `AM`/`PM`, and a `Fri, Jul 14 2017` date line.

use core::fmt::Write;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use heapless::String;

/// Whether the locale uses a 12- or 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourStyle {
    H12,
    H24,
}

/// Hours and minutes. 24-hour style pads the hour; 12-hour style does not
/// and maps midnight/noon to 12.
pub fn time_text(time: NaiveDateTime, style: HourStyle) -> String<8> {
    let mut out = String::new();
    match style {
        HourStyle::H24 => {
            write!(out, "{:02}:{:02}", time.hour(), time.minute()).ok();
        }
        HourStyle::H12 => {
            let (_, hour) = time.hour12();
            write!(out, "{}:{:02}", hour, time.minute()).ok();
        }
    }
    out
}

/// Two-digit seconds suffix shown in interactive mode.
pub fn seconds_text(time: NaiveDateTime) -> String<4> {
    let mut out = String::new();
    write!(out, "{:02}", time.second()).ok();
    out
}

/// Meridiem suffix shown in ambient mode under a 12-hour style.
pub fn meridiem_text(time: NaiveDateTime) -> &'static str {
    let (is_pm, _) = time.hour12();
    if is_pm { "PM" } else { "AM" }
}

/// Full date line: `Fri, Jul 14 2017`.
pub fn date_text(time: NaiveDateTime) -> String<20> {
    let mut out = String::new();
    write!(
        out,
        "{}, {} {} {}",
        weekday_abbrev(time.weekday()),
        month_abbrev(time.month0()),
        time.day(),
        time.year()
    )
    .ok();
    out
}

fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn month_abbrev(month0: u32) -> &'static str {
    match month0 {
        0 => "Jan",
        1 => "Feb",
        2 => "Mar",
        3 => "Apr",
        4 => "May",
        5 => "Jun",
        6 => "Jul",
        7 => "Aug",
        8 => "Sep",
        9 => "Oct",
        10 => "Nov",
        _ => "Dec",
    }
}
