use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use common::{CourtBookingError, DbConn, Error};
use db::{
	CourtBookingStatus,
	InvalidTransition,
	StatusEvent,
	court_booking,
	court_booking_companion,
	profile,
};
use diesel::pg::Pg;
use diesel::prelude::*;
use primitives::{
	PrimitiveCourtBooking,
	PrimitiveCourtBookingCompanion,
	PrimitiveProfile,
	ProfileSummary,
};
use serde::{Deserialize, Serialize};

use crate::court::escape_like;
use crate::{
	BlockedEmail,
	BookingParticipants,
	ConflictMode,
	Court,
	Profile,
	TimeSlot,
	check_companion_count,
	check_conflicts,
	validate_companion_emails,
};

/// Maximum number of bookings in a profile's history
pub const HISTORY_LIMIT: i64 = 100;

/// A booking together with the people taking part in it
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtBooking {
	pub primitive:  PrimitiveCourtBooking,
	pub requester:  ProfileSummary,
	pub companions: Vec<ProfileSummary>,
}

/// A request from a profile to book a slot on a court
#[derive(Clone, Debug)]
pub struct CourtBookingRequest {
	pub court_id:   i32,
	pub date:       NaiveDate,
	pub time_slot:  String,
	pub companions: Vec<String>,
}

/// Filters for the operator view of all bookings
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtBookingFilter {
	/// Case-insensitive substring of the court name
	pub search: Option<String>,
	pub status: Option<CourtBookingStatus>,
	pub date:   Option<NaiveDate>,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = court_booking)]
#[diesel(check_for_backend(Pg))]
struct InsertableCourtBooking {
	court_id:       i32,
	court_name:     String,
	start_time:     NaiveDateTime,
	end_time:       NaiveDateTime,
	status:         CourtBookingStatus,
	requested_user: i32,
	court_type:     String,
	created_at:     NaiveDateTime,
	updated_at:     NaiveDateTime,
}

type CompanionRow = (PrimitiveCourtBookingCompanion, ProfileSummary);

/// The half-open range of timestamps falling on a date
fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
	let start = date.and_time(NaiveTime::MIN);

	(start, start + TimeDelta::days(1))
}

fn transition_error(err: InvalidTransition) -> Error {
	CourtBookingError::InvalidTransition {
		from:  err.from.to_string(),
		event: err.event.to_string(),
	}
	.into()
}

fn not_found(query_id: i32, err: diesel::result::Error) -> Error {
	match err {
		diesel::result::Error::NotFound => {
			Error::NotFound(format!("court booking {query_id}"))
		},
		e => e.into(),
	}
}

fn filtered_query(
	filter: &CourtBookingFilter,
) -> court_booking::BoxedQuery<'static, Pg> {
	let mut query = court_booking::table.into_boxed();

	if let Some(search) = filter.search.as_deref().map(str::trim) {
		if !search.is_empty() {
			let pattern = format!("%{}%", escape_like(search));

			query = query.filter(court_booking::court_name.ilike(pattern));
		}
	}

	if let Some(status) = filter.status {
		query = query.filter(court_booking::status.eq(status));
	}

	if let Some(date) = filter.date {
		let (from, until) = day_bounds(date);

		query = query
			.filter(court_booking::start_time.ge(from))
			.filter(court_booking::start_time.lt(until));
	}

	query
}

impl CourtBooking {
	/// Attach requesters and companions to a list of bookings, keeping order
	async fn assemble(
		bookings: Vec<PrimitiveCourtBooking>,
		conn: &DbConn,
	) -> Result<Vec<Self>, Error> {
		if bookings.is_empty() {
			return Ok(vec![]);
		}

		let parents = bookings.clone();

		let (requesters, companions) = conn
			.interact(move |conn| {
				let requester_ids: Vec<i32> =
					parents.iter().map(|b| b.requested_user).collect();

				let requesters: Vec<ProfileSummary> = profile::table
					.filter(profile::id.eq_any(requester_ids))
					.select(ProfileSummary::as_select())
					.get_results(conn)?;

				let companions =
					PrimitiveCourtBookingCompanion::belonging_to(&parents)
						.inner_join(profile::table)
						.select((
							PrimitiveCourtBookingCompanion::as_select(),
							ProfileSummary::as_select(),
						))
						.load::<CompanionRow>(conn)?
						.grouped_by(&parents);

				Ok::<_, diesel::result::Error>((requesters, companions))
			})
			.await??;

		let requesters: HashMap<i32, ProfileSummary> =
			requesters.into_iter().map(|p| (p.id, p)).collect();

		bookings
			.into_iter()
			.zip(companions)
			.map(|(primitive, companions)| {
				let requester = requesters
					.get(&primitive.requested_user)
					.cloned()
					.ok_or_else(|| {
						Error::Infallible(format!(
							"booking {} has no requester",
							primitive.id
						))
					})?;

				let companions =
					companions.into_iter().map(|(_, p)| p).collect();

				Ok(Self { primitive, requester, companions })
			})
			.collect()
	}

	/// Get a [`CourtBooking`] given its id
	#[instrument(skip(conn))]
	pub async fn get(query_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let booking = conn
			.interact(move |conn| {
				use self::court_booking::dsl::*;

				court_booking
					.find(query_id)
					.select(PrimitiveCourtBooking::as_select())
					.get_result(conn)
			})
			.await?
			.map_err(|e| not_found(query_id, e))?;

		let mut assembled = Self::assemble(vec![booking], conn).await?;

		assembled
			.pop()
			.ok_or_else(|| Error::NotFound(format!("court booking {query_id}")))
	}

	/// Bookings a profile requested or joins as a companion, newest first
	#[instrument(skip(conn))]
	pub async fn get_for_profile(
		query_profile_id: i32,
		conn: &DbConn,
	) -> Result<Vec<Self>, Error> {
		let bookings = conn
			.interact(move |conn| {
				use self::court_booking::dsl::*;
				use self::court_booking_companion as companion;

				let joined = companion::table
					.filter(companion::profile_id.eq(query_profile_id))
					.select(companion::court_booking_id);

				court_booking
					.filter(
						requested_user
							.eq(query_profile_id)
							.or(id.eq_any(joined)),
					)
					.order((start_time.desc(), id.desc()))
					.limit(HISTORY_LIMIT)
					.select(PrimitiveCourtBooking::as_select())
					.get_results(conn)
			})
			.await??;

		Self::assemble(bookings, conn).await
	}

	/// Get a page of all bookings matching a filter, newest first, and the
	/// total number of matches
	#[instrument(skip(conn))]
	pub async fn get_all(
		filter: CourtBookingFilter,
		limit: i64,
		offset: i64,
		conn: &DbConn,
	) -> Result<(i64, Vec<Self>), Error> {
		let (total, bookings) = conn
			.interact(move |conn| {
				use self::court_booking::{id, start_time};

				let total: i64 =
					filtered_query(&filter).count().get_result(conn)?;

				let bookings = filtered_query(&filter)
					.order((start_time.desc(), id.desc()))
					.limit(limit)
					.offset(offset)
					.select(PrimitiveCourtBooking::as_select())
					.get_results::<PrimitiveCourtBooking>(conn)?;

				Ok::<_, diesel::result::Error>((total, bookings))
			})
			.await??;

		let bookings = Self::assemble(bookings, conn).await?;

		Ok((total, bookings))
	}

	/// All bookings of a court starting on a date, in any status
	#[instrument(skip(conn))]
	pub async fn get_by_court_and_date(
		query_court_id: i32,
		date: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<PrimitiveCourtBooking>, Error> {
		let (from, until) = day_bounds(date);

		let bookings = conn
			.interact(move |conn| {
				use self::court_booking::dsl::*;

				court_booking
					.filter(court_id.eq(query_court_id))
					.filter(start_time.ge(from))
					.filter(start_time.lt(until))
					.order(start_time)
					.select(PrimitiveCourtBooking::as_select())
					.get_results(conn)
			})
			.await??;

		Ok(bookings)
	}

	/// The participants of every active booking of a court type on a date
	#[instrument(skip(conn))]
	pub async fn get_active_participants(
		query_court_type: String,
		date: NaiveDate,
		conn: &DbConn,
	) -> Result<Vec<BookingParticipants>, Error> {
		let (from, until) = day_bounds(date);

		let participants = conn
			.interact(move |conn| {
				use self::court_booking::dsl::*;

				let bookings: Vec<PrimitiveCourtBooking> = court_booking
					.filter(court_type.eq(query_court_type))
					.filter(status.eq_any(CourtBookingStatus::ACTIVE))
					.filter(start_time.ge(from))
					.filter(start_time.lt(until))
					.select(PrimitiveCourtBooking::as_select())
					.get_results(conn)?;

				let companions =
					PrimitiveCourtBookingCompanion::belonging_to(&bookings)
						.select(PrimitiveCourtBookingCompanion::as_select())
						.load::<PrimitiveCourtBookingCompanion>(conn)?
						.grouped_by(&bookings);

				let participants = bookings
					.iter()
					.zip(companions)
					.map(|(b, c)| {
						BookingParticipants {
							requested_user: b.requested_user,
							companions:     c
								.into_iter()
								.map(|c| c.profile_id)
								.collect(),
						}
					})
					.collect::<Vec<_>>();

				Ok::<_, diesel::result::Error>(participants)
			})
			.await??;

		Ok(participants)
	}

	/// Whether a profile already takes part in an active booking of a court
	/// type on a date
	#[instrument(skip(conn))]
	pub async fn has_active_booking(
		query_profile_id: i32,
		query_court_type: String,
		date: NaiveDate,
		conn: &DbConn,
	) -> Result<bool, Error> {
		let active =
			Self::get_active_participants(query_court_type, date, conn).await?;

		Ok(check_conflicts(&[query_profile_id], &active).is_err())
	}

	/// Validate a booking request and store it
	///
	/// `now` is the current campus wall-clock time.
	#[instrument(skip(requester, conn), fields(requester = requester.id))]
	pub async fn create(
		request: CourtBookingRequest,
		requester: &PrimitiveProfile,
		now: NaiveDateTime,
		mode: ConflictMode,
		conn: &DbConn,
	) -> Result<Self, Error> {
		BlockedEmail::ensure_not_blocked(&requester.email, now, conn).await?;

		let court = Court::get(request.court_id, conn).await?;

		let slot: TimeSlot = request.time_slot.parse()?;

		let available =
			court.available_slots(request.date, now, mode, conn).await?;

		if !available.contains(&slot) {
			return Err(
				CourtBookingError::SlotUnavailable(slot.to_string()).into()
			);
		}

		let emails =
			validate_companion_emails(&requester.email, &request.companions)?;
		let companions = Profile::resolve_emails(emails, conn).await?;

		check_companion_count(court.primitive.min_users, companions.len())?;

		let companion_ids: Vec<i32> = companions.iter().map(|p| p.id).collect();
		let participants: Vec<i32> = std::iter::once(requester.id)
			.chain(companion_ids.iter().copied())
			.collect();

		let active = Self::get_active_participants(
			court.primitive.court_type.clone(),
			request.date,
			conn,
		)
		.await?;

		check_conflicts(&participants, &active)?;

		let (start, end) = Court::slot_span(request.date, slot);

		let insertable = InsertableCourtBooking {
			court_id:       court.primitive.id,
			court_name:     court.primitive.name.clone(),
			start_time:     start,
			end_time:       end,
			status:         CourtBookingStatus::Reserved,
			requested_user: requester.id,
			court_type:     court.primitive.court_type.clone(),
			created_at:     now,
			updated_at:     now,
		};

		let booking = conn
			.interact(move |conn| {
				conn.transaction(|conn| {
					let booking = diesel::insert_into(court_booking::table)
						.values(insertable)
						.returning(PrimitiveCourtBooking::as_returning())
						.get_result(conn)?;

					let rows: Vec<PrimitiveCourtBookingCompanion> =
						companion_ids
							.into_iter()
							.map(|profile_id| {
								PrimitiveCourtBookingCompanion {
									court_booking_id: booking.id,
									profile_id,
								}
							})
							.collect();

					diesel::insert_into(court_booking_companion::table)
						.values(rows)
						.execute(conn)?;

					Ok::<_, diesel::result::Error>(booking)
				})
			})
			.await??;

		info!(
			"profile {} booked court {} from {} to {}",
			requester.id, booking.court_id, booking.start_time, booking.end_time
		);

		Self::get(booking.id, conn).await
	}

	/// Delete a booking and its companion rows
	#[instrument(skip(conn))]
	pub async fn delete(query_id: i32, conn: &DbConn) -> Result<(), Error> {
		let count = conn
			.interact(move |conn| {
				use self::court_booking::dsl::*;

				diesel::delete(court_booking.find(query_id)).execute(conn)
			})
			.await??;

		if count == 0 {
			return Err(Error::NotFound(format!("court booking {query_id}")));
		}

		info!("deleted court booking {query_id}");

		Ok(())
	}

	/// Move a booking through its lifecycle
	///
	/// `now` is the current campus wall-clock time. It stamps `updated_at`
	/// and, when punching in or out, the matching punch time.
	#[instrument(skip(conn))]
	pub async fn apply_event(
		query_id: i32,
		event: StatusEvent,
		now: NaiveDateTime,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let current = Self::get(query_id, conn).await?.primitive.status;

		let next = current.transition(event).map_err(transition_error)?;

		let updated = conn
			.interact(move |conn| {
				use self::court_booking::dsl::*;

				// Only move the booking if nobody changed it in the meantime
				let target =
					court_booking.find(query_id).filter(status.eq(current));

				match event {
					StatusEvent::PunchIn => {
						diesel::update(target)
							.set((
								status.eq(next),
								punched_in_at.eq(Some(now)),
								updated_at.eq(now),
							))
							.execute(conn)
					},
					StatusEvent::PunchOut => {
						diesel::update(target)
							.set((
								status.eq(next),
								punched_out_at.eq(Some(now)),
								updated_at.eq(now),
							))
							.execute(conn)
					},
					StatusEvent::MarkLate => {
						diesel::update(target)
							.set((status.eq(next), updated_at.eq(now)))
							.execute(conn)
					},
				}
			})
			.await??;

		let booking = Self::get(query_id, conn).await?;

		if updated == 0 {
			booking
				.primitive
				.status
				.transition(event)
				.map_err(transition_error)?;

			return Err(Error::Duplicate(format!(
				"court booking {query_id} was modified concurrently"
			)));
		}

		info!("court booking {query_id} is now {next}");

		Ok(booking)
	}

	/// Mark every reserved booking that started more than `threshold` before
	/// `now` as late
	///
	/// Returns the bookings that were updated
	#[instrument(skip(conn))]
	pub async fn mark_late(
		now: NaiveDateTime,
		threshold: TimeDelta,
		conn: &DbConn,
	) -> Result<Vec<PrimitiveCourtBooking>, Error> {
		let late = CourtBookingStatus::Reserved
			.transition(StatusEvent::MarkLate)
			.map_err(transition_error)?;

		let cutoff = now - threshold;

		let updated = conn
			.interact(move |conn| {
				use self::court_booking::dsl::*;

				diesel::update(
					court_booking
						.filter(status.eq(CourtBookingStatus::Reserved))
						.filter(start_time.lt(cutoff)),
				)
				.set((status.eq(late), updated_at.eq(now)))
				.returning(PrimitiveCourtBooking::as_returning())
				.get_results(conn)
			})
			.await??;

		info!("marked {} court bookings as late", updated.len());

		Ok(updated)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn day_bounds_cover_one_day() {
		let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
		let (from, until) = day_bounds(date);

		assert_eq!(from.to_string(), "2025-12-31 00:00:00");
		assert_eq!(until.to_string(), "2026-01-01 00:00:00");
	}

	#[test]
	fn transition_errors_name_both_sides() {
		let err = CourtBookingStatus::Late
			.transition(StatusEvent::PunchIn)
			.map_err(transition_error)
			.unwrap_err();

		assert_eq!(
			err.to_string(),
			"invalid status transition: cannot punch in a booking that is late"
		);
		assert_eq!(err.code(), 22);
	}
}
