use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, NoContent};
use common::{DbPool, Error};
use models::Court;

use crate::Config;
use crate::schemas::court::{
	AvailableSlotsResponse,
	CourtDateQuery,
	CourtResponse,
	CourtSearchQuery,
	CreateCourtRequest,
	UpdateCourtRequest,
};
use crate::schemas::pagination::PaginationOptions;

#[instrument(skip(pool))]
pub async fn get_courts(
	State(pool): State<DbPool>,
	Query(p_opts): Query<PaginationOptions>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let (total, courts) =
		Court::get_all(p_opts.limit(), p_opts.offset(), &conn).await?;

	Ok((StatusCode::OK, Json(p_opts.paginate(total, courts)?)))
}

#[instrument(skip(pool))]
pub async fn search_courts(
	State(pool): State<DbPool>,
	Query(query): Query<CourtSearchQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let courts = Court::search(query.name, &conn).await?;

	Ok((StatusCode::OK, Json(courts)))
}

#[instrument(skip(pool))]
pub async fn get_court(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let court = Court::get(id, &conn).await?;
	let response = CourtResponse::from(court);

	Ok((StatusCode::OK, Json(response)))
}

#[instrument(skip(config, pool))]
pub async fn get_available_slots(
	State(config): State<Config>,
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
	Query(query): Query<CourtDateQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let court = Court::get(id, &conn).await?;

	let slots = court
		.available_slots(
			query.date,
			config.campus_now(),
			config.slot_conflict_mode,
			&conn,
		)
		.await?;

	let response =
		AvailableSlotsResponse { court_id: id, date: query.date, slots };

	Ok((StatusCode::OK, Json(response)))
}

#[instrument(skip(pool))]
pub async fn create_court(
	State(pool): State<DbPool>,
	Json(request): Json<CreateCourtRequest>,
) -> Result<impl IntoResponse, Error> {
	let new_court = request.to_insertable()?;

	let conn = pool.get().await?;

	let court = Court::create(new_court, &conn).await?;
	let response = CourtResponse::from(court);

	Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(pool))]
pub async fn update_court(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
	Json(request): Json<UpdateCourtRequest>,
) -> Result<impl IntoResponse, Error> {
	let changes = request.to_insertable()?;

	let conn = pool.get().await?;

	let court = Court::update(id, changes, &conn).await?;
	let response = CourtResponse::from(court);

	Ok((StatusCode::OK, Json(response)))
}

#[instrument(skip(pool))]
pub async fn delete_court(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<NoContent, Error> {
	let conn = pool.get().await?;

	Court::delete(id, &conn).await?;

	Ok(NoContent)
}
