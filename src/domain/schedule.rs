use crate::domain::Frequency;
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Days on which pickups run. There is no Sunday service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl PickupDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickupDay::Monday => "monday",
            PickupDay::Tuesday => "tuesday",
            PickupDay::Wednesday => "wednesday",
            PickupDay::Thursday => "thursday",
            PickupDay::Friday => "friday",
            PickupDay::Saturday => "saturday",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PickupDay::Monday => "Monday",
            PickupDay::Tuesday => "Tuesday",
            PickupDay::Wednesday => "Wednesday",
            PickupDay::Thursday => "Thursday",
            PickupDay::Friday => "Friday",
            PickupDay::Saturday => "Saturday",
        }
    }

    pub fn weekday(&self) -> Weekday {
        match self {
            PickupDay::Monday => Weekday::Mon,
            PickupDay::Tuesday => Weekday::Tue,
            PickupDay::Wednesday => Weekday::Wed,
            PickupDay::Thursday => Weekday::Thu,
            PickupDay::Friday => Weekday::Fri,
            PickupDay::Saturday => Weekday::Sat,
        }
    }
}

impl TryFrom<&str> for PickupDay {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            other => Err(format!("{} is not a pickup day.", other)),
        }
    }
}

/// One of the two-hour pickup windows between 08:00 and 20:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickupWindow {
    start_hour: u8,
}

impl PickupWindow {
    const FIRST_START: u8 = 8;
    const LAST_START: u8 = 18;
    const LENGTH_HOURS: u8 = 2;

    pub fn all() -> impl Iterator<Item = PickupWindow> {
        (Self::FIRST_START..=Self::LAST_START)
            .step_by(Self::LENGTH_HOURS as usize)
            .map(|start_hour| PickupWindow { start_hour })
    }

    /// Parses a `HH:MM` start/end pair, e.g. `("08:00", "10:00")`.
    pub fn parse(start: &str, end: &str) -> Result<PickupWindow, String> {
        let start_hour = parse_whole_hour(start)?;
        let end_hour = parse_whole_hour(end)?;
        let window = PickupWindow { start_hour };
        if Self::all().any(|w| w == window) && end_hour == start_hour + Self::LENGTH_HOURS {
            Ok(window)
        } else {
            Err(format!("{}-{} is not a pickup window.", start, end))
        }
    }

    pub fn start(&self) -> String {
        format!("{:02}:00", self.start_hour)
    }

    pub fn end(&self) -> String {
        format!("{:02}:00", self.end_hour())
    }

    /// e.g. "8:00 AM - 10:00 AM"
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            format_hour(self.start_hour),
            format_hour(self.end_hour())
        )
    }

    fn end_hour(&self) -> u8 {
        self.start_hour + Self::LENGTH_HOURS
    }
}

impl Default for PickupWindow {
    fn default() -> Self {
        PickupWindow {
            start_hour: Self::FIRST_START,
        }
    }
}

fn parse_whole_hour(time: &str) -> Result<u8, String> {
    let (hours, minutes) = time
        .split_once(':')
        .ok_or_else(|| format!("{} is not a HH:MM time.", time))?;
    if minutes != "00" || hours.len() != 2 {
        return Err(format!("{} does not start on the hour.", time));
    }
    hours
        .parse::<u8>()
        .map_err(|_| format!("{} is not a HH:MM time.", time))
}

fn format_hour(hour: u8) -> String {
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{}:00 {}", display_hour, meridiem)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupDays {
    Once(PickupDay),
    Twice(PickupDay, PickupDay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Twice-weekly plans need a second pickup day.")]
    MissingSecondDay,
    #[error("The second pickup day must differ from the first.")]
    SameDayTwice,
}

/// Recurring pickup days and window of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupSchedule {
    pub days: PickupDays,
    pub window: PickupWindow,
}

impl PickupSchedule {
    /// The second day is required, and must differ from the first, only for
    /// twice-weekly plans. Other frequencies ignore it.
    pub fn new(
        frequency: Frequency,
        first_day: PickupDay,
        second_day: Option<PickupDay>,
        window: PickupWindow,
    ) -> Result<PickupSchedule, ScheduleError> {
        let days = if frequency.requires_second_day() {
            match second_day {
                None => return Err(ScheduleError::MissingSecondDay),
                Some(day) if day == first_day => return Err(ScheduleError::SameDayTwice),
                Some(day) => PickupDays::Twice(first_day, day),
            }
        } else {
            PickupDays::Once(first_day)
        };
        Ok(PickupSchedule { days, window })
    }

    pub fn first_day(&self) -> PickupDay {
        match self.days {
            PickupDays::Once(day) | PickupDays::Twice(day, _) => day,
        }
    }

    pub fn second_day(&self) -> Option<PickupDay> {
        match self.days {
            PickupDays::Once(_) => None,
            PickupDays::Twice(_, day) => Some(day),
        }
    }
}
