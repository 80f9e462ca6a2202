//! Companion validation and the one-active-booking-per-court-type rule

use std::collections::HashSet;

use common::CourtBookingError;

/// Normalize an email for comparison
#[must_use]
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// Validate the companion emails of a booking request
///
/// Blank entries are ignored. Returns the normalized emails in the order
/// they were given.
///
/// # Errors
/// Fails if a companion is the requester, or if an email occurs twice
pub fn validate_companion_emails(
	requester_email: &str,
	emails: &[String],
) -> Result<Vec<String>, CourtBookingError> {
	let requester = normalize_email(requester_email);

	let emails: Vec<String> = emails
		.iter()
		.map(|e| normalize_email(e))
		.filter(|e| !e.is_empty())
		.collect();

	if emails.iter().any(|e| *e == requester) {
		return Err(CourtBookingError::SelfCompanion);
	}

	let mut seen = HashSet::with_capacity(emails.len());

	if !emails.iter().all(|e| seen.insert(e.as_str())) {
		return Err(CourtBookingError::DuplicateCompanion);
	}

	Ok(emails)
}

/// Check that enough companions were given for a court
///
/// # Errors
/// Fails if fewer than `min_users - 1` companions are present
pub fn check_companion_count(
	min_users: i32,
	given: usize,
) -> Result<(), CourtBookingError> {
	let required = usize::try_from(min_users.saturating_sub(1)).unwrap_or(0);

	if given < required {
		return Err(CourtBookingError::NotEnoughCompanions { required, given });
	}

	Ok(())
}

/// The people attached to an existing active booking
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingParticipants {
	pub requested_user: i32,
	pub companions:     Vec<i32>,
}

impl BookingParticipants {
	fn involves(&self, profile_id: i32) -> bool {
		self.requested_user == profile_id
			|| self.companions.contains(&profile_id)
	}
}

/// Reject a new booking if any of its participants already takes part in one
/// of the given active bookings
///
/// `active` must only hold bookings of the same court type on the same date
/// with an active status.
///
/// # Errors
/// Fails with [`CourtBookingError::OngoingReservation`] on any overlap
pub fn check_conflicts(
	participants: &[i32],
	active: &[BookingParticipants],
) -> Result<(), CourtBookingError> {
	let clash = participants
		.iter()
		.any(|p| active.iter().any(|booking| booking.involves(*p)));

	if clash {
		return Err(CourtBookingError::OngoingReservation);
	}

	Ok(())
}
