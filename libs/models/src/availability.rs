//! Filtering generated slots against existing bookings and the clock

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use primitives::PrimitiveCourtBooking;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TimeSlot;

/// How a stored booking is matched against a candidate slot
#[derive(
	Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictMode {
	/// A booking takes a slot only if it starts exactly at the slot start
	#[default]
	ExactStart,
	/// A booking takes every slot its interval overlaps
	Overlap,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown conflict mode '{0}', expected 'exact-start' or 'overlap'")]
pub struct UnknownConflictMode(pub String);

impl FromStr for ConflictMode {
	type Err = UnknownConflictMode;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"exact-start" => Ok(Self::ExactStart),
			"overlap" => Ok(Self::Overlap),
			_ => Err(UnknownConflictMode(s.to_string())),
		}
	}
}

/// The interval occupied by an existing booking
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookedSpan {
	pub start: NaiveDateTime,
	pub end:   NaiveDateTime,
}

impl From<&PrimitiveCourtBooking> for BookedSpan {
	fn from(value: &PrimitiveCourtBooking) -> Self {
		Self { start: value.start_time, end: value.end_time }
	}
}

impl BookedSpan {
	fn takes(
		&self,
		start: NaiveDateTime,
		end: NaiveDateTime,
		mode: ConflictMode,
	) -> bool {
		match mode {
			ConflictMode::ExactStart => self.start == start,
			ConflictMode::Overlap => self.start < end && start < self.end,
		}
	}
}

/// Drop every slot on `date` that is already booked or, when `date` is
/// today, has already ended
///
/// `now` is the current campus wall-clock time.
#[must_use]
pub fn available_slots(
	date: NaiveDate,
	slots: Vec<TimeSlot>,
	booked: &[BookedSpan],
	now: NaiveDateTime,
	mode: ConflictMode,
) -> Vec<TimeSlot> {
	let is_today = date == now.date();

	slots
		.into_iter()
		.filter(|slot| !(is_today && slot.end <= now.time()))
		.filter(|slot| {
			let start = date.and_time(slot.start);
			let end = date.and_time(slot.end);

			!booked.iter().any(|b| b.takes(start, end, mode))
		})
		.collect()
}
