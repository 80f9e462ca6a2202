//! Weekly opening windows of a court and the fixed-length slots they offer

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, TimeDelta, Weekday};
use common::Error;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

const WINDOW_FORMAT: &str = "%H:%M";
const SLOT_FORMAT: &str = "%H:%M:%S";

const WEEKDAYS: [Weekday; 7] = [
	Weekday::Mon,
	Weekday::Tue,
	Weekday::Wed,
	Weekday::Thu,
	Weekday::Fri,
	Weekday::Sat,
	Weekday::Sun,
];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
	#[error("invalid opening window '{0}', expected HH:MM-HH:MM")]
	InvalidWindow(String),
	#[error("invalid time slot '{0}', expected HH:MM:SS - HH:MM:SS")]
	InvalidSlot(String),
	#[error("unknown weekday '{0}'")]
	UnknownWeekday(String),
	#[error("malformed schedule -- {0}")]
	Malformed(String),
}

impl From<ScheduleError> for Error {
	fn from(value: ScheduleError) -> Self {
		match value {
			ScheduleError::InvalidSlot(slot) => {
				common::CourtBookingError::InvalidTimeSlot(slot).into()
			},
			e => Self::ValidationError(e.to_string()),
		}
	}
}

/// Full english name of a weekday, as used for schedule keys
#[must_use]
pub fn weekday_name(day: Weekday) -> &'static str {
	match day {
		Weekday::Mon => "Monday",
		Weekday::Tue => "Tuesday",
		Weekday::Wed => "Wednesday",
		Weekday::Thu => "Thursday",
		Weekday::Fri => "Friday",
		Weekday::Sat => "Saturday",
		Weekday::Sun => "Sunday",
	}
}

/// Parse a full weekday name, ignoring case and surrounding whitespace
#[must_use]
pub fn parse_weekday_name(name: &str) -> Option<Weekday> {
	let name = name.trim();

	WEEKDAYS
		.into_iter()
		.find(|d| weekday_name(*d).eq_ignore_ascii_case(name))
}

/// A daily interval during which a court can be booked
#[derive(
	Clone, Copy, Debug, DeserializeFromStr, PartialEq, Eq, SerializeDisplay,
)]
pub struct OpenWindow {
	pub open:  NaiveTime,
	pub close: NaiveTime,
}

impl FromStr for OpenWindow {
	type Err = ScheduleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ScheduleError::InvalidWindow(s.to_string());

		let (open, close) = s.split_once('-').ok_or_else(err)?;

		let open = NaiveTime::parse_from_str(open.trim(), WINDOW_FORMAT)
			.map_err(|_| err())?;
		let close = NaiveTime::parse_from_str(close.trim(), WINDOW_FORMAT)
			.map_err(|_| err())?;

		Ok(Self { open, close })
	}
}

impl fmt::Display for OpenWindow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}-{}",
			self.open.format(WINDOW_FORMAT),
			self.close.format(WINDOW_FORMAT)
		)
	}
}

/// A single bookable slot within a day
#[derive(
	Clone, Copy, Debug, DeserializeFromStr, PartialEq, Eq, SerializeDisplay,
)]
pub struct TimeSlot {
	pub start: NaiveTime,
	pub end:   NaiveTime,
}

impl FromStr for TimeSlot {
	type Err = ScheduleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ScheduleError::InvalidSlot(s.to_string());

		let (start, end) = s.split_once('-').ok_or_else(err)?;

		let parse = |t: &str| {
			NaiveTime::parse_from_str(t.trim(), SLOT_FORMAT)
				.or_else(|_| NaiveTime::parse_from_str(t.trim(), WINDOW_FORMAT))
				.map_err(|_| err())
		};

		let slot = Self { start: parse(start)?, end: parse(end)? };

		if slot.end <= slot.start {
			return Err(err());
		}

		Ok(slot)
	}
}

impl fmt::Display for TimeSlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} - {}",
			self.start.format(SLOT_FORMAT),
			self.end.format(SLOT_FORMAT)
		)
	}
}

/// Opening windows for every day of the week
///
/// Stored as JSON text mapping full weekday names to lists of
/// `"HH:MM-HH:MM"` windows, e.g. `{"Monday": ["06:00-08:00"]}`. Windows
/// keep the order they were given in.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(
	try_from = "BTreeMap<String, Vec<OpenWindow>>",
	into = "BTreeMap<String, Vec<OpenWindow>>"
)]
pub struct WeeklySchedule {
	days: [Vec<OpenWindow>; 7],
}

impl TryFrom<BTreeMap<String, Vec<OpenWindow>>> for WeeklySchedule {
	type Error = ScheduleError;

	fn try_from(
		value: BTreeMap<String, Vec<OpenWindow>>,
	) -> Result<Self, Self::Error> {
		let mut schedule = Self::default();

		for (name, windows) in value {
			let day = parse_weekday_name(&name)
				.ok_or(ScheduleError::UnknownWeekday(name))?;

			schedule.days[day.num_days_from_monday() as usize].extend(windows);
		}

		Ok(schedule)
	}
}

impl From<WeeklySchedule> for BTreeMap<String, Vec<OpenWindow>> {
	fn from(value: WeeklySchedule) -> Self {
		WEEKDAYS
			.into_iter()
			.zip(value.days)
			.filter(|(_, windows)| !windows.is_empty())
			.map(|(day, windows)| (weekday_name(day).to_string(), windows))
			.collect()
	}
}

impl WeeklySchedule {
	/// Parse a schedule from its stored JSON text
	///
	/// # Errors
	/// Fails on malformed JSON, unknown weekday names or malformed windows
	pub fn parse(text: &str) -> Result<Self, ScheduleError> {
		serde_json::from_str(text)
			.map_err(|e| ScheduleError::Malformed(e.to_string()))
	}

	/// Serialize this schedule into its stored JSON text
	#[must_use]
	pub fn to_text(&self) -> String {
		let map: BTreeMap<String, Vec<OpenWindow>> = self.clone().into();

		// A map of strings to displayable values always serializes
		serde_json::to_string(&map).unwrap_or_default()
	}

	/// Set the windows for a given weekday
	#[must_use]
	pub fn with_day(mut self, day: Weekday, windows: Vec<OpenWindow>) -> Self {
		self.days[day.num_days_from_monday() as usize] = windows;
		self
	}

	/// The windows configured for a weekday, empty if the court is closed
	#[must_use]
	pub fn windows_for(&self, day: Weekday) -> &[OpenWindow] {
		&self.days[day.num_days_from_monday() as usize]
	}

	/// Whether any weekday has at least one window
	#[must_use]
	pub fn is_empty(&self) -> bool { self.days.iter().all(Vec::is_empty) }
}

/// Convert a fractional amount of hours into a slot length
///
/// The length is truncated to whole minutes so slot bounds always render
/// exactly. Returns [`None`] for non-finite values or anything shorter than
/// a minute.
#[must_use]
pub fn slot_length_from_hours(hours: f64) -> Option<TimeDelta> {
	if !hours.is_finite() || hours <= 0.0 {
		return None;
	}

	#[allow(clippy::cast_possible_truncation)]
	let minutes = (hours * 60.0).trunc() as i64;

	(minutes > 0).then(|| TimeDelta::minutes(minutes))
}

/// Split every window into consecutive slots of exactly `slot_length`
///
/// A trailing remainder shorter than `slot_length` is dropped. Windows that
/// do not close after they open never produce slots.
#[must_use]
pub fn generate_slots(
	windows: &[OpenWindow],
	slot_length: TimeDelta,
) -> Vec<TimeSlot> {
	let mut slots = vec![];

	if slot_length <= TimeDelta::zero() {
		return slots;
	}

	for window in windows {
		if window.close <= window.open {
			continue;
		}

		let mut current = window.open;

		loop {
			let (end, wrapped) = current.overflowing_add_signed(slot_length);

			if wrapped != 0 || end > window.close {
				break;
			}

			slots.push(TimeSlot { start: current, end });
			current = end;
		}
	}

	slots
}
