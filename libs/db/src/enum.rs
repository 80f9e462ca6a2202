use std::fmt;
use std::str::FromStr;

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(
	Clone,
	Copy,
	DbEnum,
	Debug,
	Default,
	Deserialize,
	Hash,
	PartialEq,
	Eq,
	Serialize,
)]
#[ExistingTypePath = "crate::sql_types::ProfileRole"]
pub enum ProfileRole {
	#[default]
	Student,
	Society,
	Council,
	Manager,
	Admin,
}

impl ProfileRole {
	/// Roles listed when searching profiles without any filter
	pub const PRIVILEGED: [Self; 3] =
		[Self::Admin, Self::Society, Self::Council];

	/// Whether this role may operate court bookings (punch in/out, late)
	#[must_use]
	pub fn is_operator(self) -> bool {
		matches!(self, Self::Manager | Self::Admin)
	}
}

impl fmt::Display for ProfileRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Student => "Student",
			Self::Society => "Society",
			Self::Council => "Council",
			Self::Manager => "Manager",
			Self::Admin => "Admin",
		};

		write!(f, "{name}")
	}
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for ProfileRole {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"student" => Ok(Self::Student),
			"society" => Ok(Self::Society),
			"council" => Ok(Self::Council),
			"manager" => Ok(Self::Manager),
			"admin" => Ok(Self::Admin),
			_ => Err(UnknownRole(s.to_string())),
		}
	}
}

/// Lifecycle of a court booking
///
/// ```text
/// reserved --punch in--> punched-in --punch out--> punched-out
///     |                      |
///     +------mark late-------+--> late
/// ```
///
/// `punched-out` and `late` are terminal.
#[derive(
	Clone,
	Copy,
	DbEnum,
	Debug,
	Default,
	Deserialize,
	Hash,
	PartialEq,
	Eq,
	Serialize,
)]
#[ExistingTypePath = "crate::sql_types::CourtBookingStatus"]
#[serde(rename_all = "kebab-case")]
pub enum CourtBookingStatus {
	#[default]
	Reserved,
	PunchedIn,
	PunchedOut,
	Late,
}

/// An operator event that may move a booking to another status
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusEvent {
	PunchIn,
	PunchOut,
	MarkLate,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("cannot {event} a booking that is {from}")]
pub struct InvalidTransition {
	pub from:  CourtBookingStatus,
	pub event: StatusEvent,
}

impl CourtBookingStatus {
	/// Statuses that count towards the one-active-booking-per-type rule
	pub const ACTIVE: [Self; 2] = [Self::Reserved, Self::PunchedIn];

	/// Apply an event to this status, rejecting any move not in the
	/// lifecycle
	///
	/// # Errors
	/// Fails if the event is not allowed from the current status
	pub fn transition(
		self,
		event: StatusEvent,
	) -> Result<Self, InvalidTransition> {
		match (self, event) {
			(Self::Reserved, StatusEvent::PunchIn) => Ok(Self::PunchedIn),
			(Self::PunchedIn, StatusEvent::PunchOut) => Ok(Self::PunchedOut),
			(Self::Reserved | Self::PunchedIn, StatusEvent::MarkLate) => {
				Ok(Self::Late)
			},
			(from, event) => Err(InvalidTransition { from, event }),
		}
	}

	#[must_use]
	pub fn is_active(self) -> bool { Self::ACTIVE.contains(&self) }

	#[must_use]
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::PunchedOut | Self::Late)
	}
}

impl fmt::Display for CourtBookingStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Reserved => "reserved",
			Self::PunchedIn => "punched-in",
			Self::PunchedOut => "punched-out",
			Self::Late => "late",
		};

		write!(f, "{name}")
	}
}

impl fmt::Display for StatusEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::PunchIn => "punch in",
			Self::PunchOut => "punch out",
			Self::MarkLate => "mark late",
		};

		write!(f, "{name}")
	}
}
