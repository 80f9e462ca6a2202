use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use common::{DbConn, Error};
use db::court;
use diesel::prelude::*;
use primitives::{CourtSummary, PrimitiveCourt};
use serde::{Deserialize, Serialize};

use crate::{
	BookedSpan,
	ConflictMode,
	CourtBooking,
	ScheduleError,
	TimeSlot,
	WeeklySchedule,
	available_slots,
	generate_slots,
	slot_length_from_hours,
};

/// Maximum number of results returned by a court name search
pub const COURT_SEARCH_LIMIT: i64 = 100;

/// Data needed to insert a new court
#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = court)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewCourt {
	pub name:       String,
	pub image:      Option<String>,
	pub location:   String,
	pub court_type: String,
	pub min_users:  i32,
	pub max_time:   f64,
	pub time_slots: String,
}

/// A partial update of a court, missing fields are left untouched
#[derive(AsChangeset, Clone, Debug, Default, Deserialize, Serialize)]
#[diesel(table_name = court)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourtUpdate {
	pub name:       Option<String>,
	pub image:      Option<String>,
	pub location:   Option<String>,
	pub court_type: Option<String>,
	pub min_users:  Option<i32>,
	pub max_time:   Option<f64>,
	pub time_slots: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Court {
	pub primitive: PrimitiveCourt,
	pub schedule:  WeeklySchedule,
}

impl TryFrom<PrimitiveCourt> for Court {
	type Error = ScheduleError;

	fn try_from(value: PrimitiveCourt) -> Result<Self, Self::Error> {
		let schedule = WeeklySchedule::parse(&value.time_slots)?;

		Ok(Self { primitive: value, schedule })
	}
}

impl Court {
	/// Get a [`Court`] given its id
	#[instrument(skip(conn))]
	pub async fn get(query_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let court = conn
			.interact(move |conn| {
				use self::court::dsl::*;

				court
					.find(query_id)
					.select(PrimitiveCourt::as_select())
					.get_result(conn)
			})
			.await?
			.map_err(|e| not_found(query_id, e))?;

		Ok(court.try_into()?)
	}

	/// Get a page of court summaries ordered by name, and the total count
	#[instrument(skip(conn))]
	pub async fn get_all(
		limit: i64,
		offset: i64,
		conn: &DbConn,
	) -> Result<(i64, Vec<CourtSummary>), Error> {
		let (total, courts) = conn
			.interact(move |conn| {
				use self::court::dsl::*;

				let total: i64 = court.count().get_result(conn)?;
				let courts: Vec<CourtSummary> = court
					.order((name, id))
					.limit(limit)
					.offset(offset)
					.select(CourtSummary::as_select())
					.get_results(conn)?;

				Ok::<_, diesel::result::Error>((total, courts))
			})
			.await??;

		Ok((total, courts))
	}

	/// Find courts whose name starts with the given prefix, case-sensitive
	#[instrument(skip(conn))]
	pub async fn search(
		prefix: String,
		conn: &DbConn,
	) -> Result<Vec<CourtSummary>, Error> {
		let pattern = format!("{}%", escape_like(&prefix));

		let courts = conn
			.interact(move |conn| {
				use self::court::dsl::*;

				court
					.filter(name.like(pattern))
					.order((name, id))
					.limit(COURT_SEARCH_LIMIT)
					.select(CourtSummary::as_select())
					.get_results(conn)
			})
			.await??;

		Ok(courts)
	}

	/// Insert a new court
	#[instrument(skip(conn))]
	pub async fn create(new: NewCourt, conn: &DbConn) -> Result<Self, Error> {
		validate_court_fields(
			Some(new.min_users),
			Some(new.max_time),
			Some(&new.time_slots),
		)?;

		let court = conn
			.interact(|conn| {
				use self::court::dsl::*;

				diesel::insert_into(court)
					.values(new)
					.returning(PrimitiveCourt::as_returning())
					.get_result(conn)
			})
			.await??;

		info!("created court {} ({})", court.id, court.name);

		Ok(court.try_into()?)
	}

	/// Apply a partial update to a court
	#[instrument(skip(conn))]
	pub async fn update(
		query_id: i32,
		changes: CourtUpdate,
		conn: &DbConn,
	) -> Result<Self, Error> {
		validate_court_fields(
			changes.min_users,
			changes.max_time,
			changes.time_slots.as_deref(),
		)?;

		let now = Utc::now().naive_utc();

		let court = conn
			.interact(move |conn| {
				use self::court::dsl::*;

				diesel::update(court.find(query_id))
					.set((changes, updated_at.eq(now)))
					.returning(PrimitiveCourt::as_returning())
					.get_result(conn)
			})
			.await?
			.map_err(|e| not_found(query_id, e))?;

		info!("updated court {query_id}");

		Ok(court.try_into()?)
	}

	/// Delete a court and, through the database cascade, its bookings
	#[instrument(skip(conn))]
	pub async fn delete(query_id: i32, conn: &DbConn) -> Result<(), Error> {
		let count = conn
			.interact(move |conn| {
				use self::court::dsl::*;

				diesel::delete(court.find(query_id)).execute(conn)
			})
			.await??;

		if count == 0 {
			return Err(Error::NotFound(format!("court {query_id}")));
		}

		info!("deleted court {query_id}");

		Ok(())
	}

	/// Number of companions a booking of this court needs
	#[must_use]
	pub fn required_companions(&self) -> usize {
		usize::try_from(self.primitive.min_users.saturating_sub(1)).unwrap_or(0)
	}

	/// Every slot this court offers on a given date, booked or not
	#[must_use]
	pub fn slots_on(&self, date: NaiveDate) -> Vec<TimeSlot> {
		let length = slot_length_from_hours(self.primitive.max_time);

		let Some(length) = length else {
			return vec![];
		};

		generate_slots(self.schedule.windows_for(date.weekday()), length)
	}

	/// The slots of this court still free on a given date
	///
	/// `now` is the current campus wall-clock time.
	#[instrument(skip(self, conn), fields(court = self.primitive.id))]
	pub async fn available_slots(
		&self,
		date: NaiveDate,
		now: NaiveDateTime,
		mode: ConflictMode,
		conn: &DbConn,
	) -> Result<Vec<TimeSlot>, Error> {
		let slots = self.slots_on(date);

		if slots.is_empty() {
			return Ok(slots);
		}

		let bookings =
			CourtBooking::get_by_court_and_date(self.primitive.id, date, conn)
				.await?;
		let booked: Vec<BookedSpan> =
			bookings.iter().map(BookedSpan::from).collect();

		Ok(available_slots(date, slots, &booked, now, mode))
	}

	/// The booking interval of a slot on a date
	#[must_use]
	pub fn slot_span(
		date: NaiveDate,
		slot: TimeSlot,
	) -> (NaiveDateTime, NaiveDateTime) {
		(date.and_time(slot.start), date.and_time(slot.end))
	}
}

fn not_found(query_id: i32, err: diesel::result::Error) -> Error {
	match err {
		diesel::result::Error::NotFound => {
			Error::NotFound(format!("court {query_id}"))
		},
		e => e.into(),
	}
}

/// Escape the LIKE wildcards of a user provided string
pub(crate) fn escape_like(s: &str) -> String {
	let mut escaped = String::with_capacity(s.len());

	for c in s.chars() {
		if matches!(c, '%' | '_' | '\\') {
			escaped.push('\\');
		}

		escaped.push(c);
	}

	escaped
}

/// Validate court fields that the database cannot check by itself
///
/// # Errors
/// Fails if `min_users < 1`, `max_time` is under a minute or the schedule is
/// malformed
pub fn validate_court_fields(
	min_users: Option<i32>,
	max_time: Option<f64>,
	time_slots: Option<&str>,
) -> Result<(), Error> {
	if min_users.is_some_and(|m| m < 1) {
		return Err(Error::ValidationError(
			"a court needs at least one user".to_string(),
		));
	}

	if max_time.is_some_and(|t| slot_length_from_hours(t).is_none()) {
		return Err(Error::ValidationError(
			"the booking length must be at least one minute".to_string(),
		));
	}

	if let Some(text) = time_slots {
		WeeklySchedule::parse(text)?;
	}

	Ok(())
}
