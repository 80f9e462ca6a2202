use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, NoContent};
use common::{DbPool, Error};
use db::StatusEvent;
use models::{Court, CourtBooking, CourtBookingFilter, Profile};

use crate::Config;
use crate::schemas::court::CourtDateQuery;
use crate::schemas::court_booking::{
	BookingPermissionQuery,
	BookingPermissionResponse,
	CourtBookingResponse,
	CreateCourtBookingRequest,
};
use crate::schemas::pagination::PaginationOptions;
use crate::session::Session;

#[instrument(skip(config, pool))]
pub async fn create_court_booking(
	State(config): State<Config>,
	State(pool): State<DbPool>,
	session: Session,
	Json(request): Json<CreateCourtBookingRequest>,
) -> Result<impl IntoResponse, Error> {
	let request = request.to_insertable()?;

	let conn = pool.get().await?;

	let requester = Profile::get(session.data.profile_id, &conn).await?;

	let booking = CourtBooking::create(
		request,
		&requester,
		config.campus_now(),
		config.slot_conflict_mode,
		&conn,
	)
	.await?;

	let response = CourtBookingResponse::from(booking);

	Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(pool))]
pub async fn get_own_court_bookings(
	State(pool): State<DbPool>,
	session: Session,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let bookings =
		CourtBooking::get_for_profile(session.data.profile_id, &conn).await?;
	let response: Vec<CourtBookingResponse> =
		bookings.into_iter().map(Into::into).collect();

	Ok((StatusCode::OK, Json(response)))
}

#[instrument(skip(pool))]
pub async fn get_court_bookings(
	State(pool): State<DbPool>,
	Query(filter): Query<CourtBookingFilter>,
	Query(p_opts): Query<PaginationOptions>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let (total, bookings) =
		CourtBooking::get_all(filter, p_opts.limit(), p_opts.offset(), &conn)
			.await?;
	let response: Vec<CourtBookingResponse> =
		bookings.into_iter().map(Into::into).collect();

	Ok((StatusCode::OK, Json(p_opts.paginate(total, response)?)))
}

#[instrument(skip(pool))]
pub async fn get_court_bookings_on_date(
	State(pool): State<DbPool>,
	Path(court_id): Path<i32>,
	Query(query): Query<CourtDateQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let bookings =
		CourtBooking::get_by_court_and_date(court_id, query.date, &conn).await?;

	Ok((StatusCode::OK, Json(bookings)))
}

/// Whether the session may still request a booking for a court on a date
#[instrument(skip(pool))]
pub async fn get_booking_permission(
	State(pool): State<DbPool>,
	session: Session,
	Query(query): Query<BookingPermissionQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let court = Court::get(query.court_id, &conn).await?;

	let busy = CourtBooking::has_active_booking(
		session.data.profile_id,
		court.primitive.court_type,
		query.date,
		&conn,
	)
	.await?;

	Ok((StatusCode::OK, Json(BookingPermissionResponse { allowed: !busy })))
}

#[instrument(skip(pool))]
pub async fn get_court_booking(
	State(pool): State<DbPool>,
	session: Session,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let booking = CourtBooking::get(id, &conn).await?;

	let profile_id = session.data.profile_id;
	let takes_part = booking.requester.id == profile_id
		|| booking.companions.iter().any(|c| c.id == profile_id);

	if !takes_part && !session.data.profile_role.is_operator() {
		return Err(Error::Forbidden);
	}

	Ok((StatusCode::OK, Json(CourtBookingResponse::from(booking))))
}

#[instrument(skip(pool))]
pub async fn delete_court_booking(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<NoContent, Error> {
	let conn = pool.get().await?;

	CourtBooking::delete(id, &conn).await?;

	Ok(NoContent)
}

async fn apply_status_event(
	config: &Config,
	pool: &DbPool,
	id: i32,
	event: StatusEvent,
) -> Result<CourtBookingResponse, Error> {
	let conn = pool.get().await?;

	let booking =
		CourtBooking::apply_event(id, event, config.campus_now(), &conn).await?;

	Ok(booking.into())
}

#[instrument(skip(config, pool))]
pub async fn punch_in_court_booking(
	State(config): State<Config>,
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let response =
		apply_status_event(&config, &pool, id, StatusEvent::PunchIn).await?;

	Ok((StatusCode::OK, Json(response)))
}

#[instrument(skip(config, pool))]
pub async fn punch_out_court_booking(
	State(config): State<Config>,
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let response =
		apply_status_event(&config, &pool, id, StatusEvent::PunchOut).await?;

	Ok((StatusCode::OK, Json(response)))
}

#[instrument(skip(config, pool))]
pub async fn mark_court_booking_late(
	State(config): State<Config>,
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let response =
		apply_status_event(&config, &pool, id, StatusEvent::MarkLate).await?;

	Ok((StatusCode::OK, Json(response)))
}

/// Mark every overdue reserved booking as late
#[instrument(skip(config, pool))]
pub async fn mark_overdue_court_bookings(
	State(config): State<Config>,
	State(pool): State<DbPool>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let now = config.campus_now();
	let updated =
		CourtBooking::mark_late(now, config.late_threshold, &conn).await?;

	Ok((StatusCode::OK, Json(updated)))
}
