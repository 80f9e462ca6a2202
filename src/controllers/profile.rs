//! Controllers for profiles and their roles

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use common::{DbPool, Error};
use models::{Profile, ProfileFilter};

use crate::navigation::Navigation;
use crate::schemas::profile::{AssignSocietyRequest, UpdateRoleRequest};
use crate::session::Session;

#[instrument(skip(pool))]
pub async fn get_current_profile(
	State(pool): State<DbPool>,
	session: Session,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let profile = Profile::get(session.data.profile_id, &conn).await?;

	Ok((StatusCode::OK, Json(profile)))
}

#[instrument(skip(pool, headers))]
pub async fn get_current_navigation(
	State(pool): State<DbPool>,
	session: Session,
	headers: HeaderMap,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let profile = Profile::get(session.data.profile_id, &conn).await?;

	let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());

	let navigation = Navigation::resolve(profile.role, host);

	Ok((StatusCode::OK, Json(navigation)))
}

#[instrument(skip(pool))]
pub async fn search_profiles(
	State(pool): State<DbPool>,
	Query(filter): Query<ProfileFilter>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let profiles = Profile::search(filter, &conn).await?;

	Ok((StatusCode::OK, Json(profiles)))
}

#[instrument(skip(pool))]
pub async fn update_profile_role(
	State(pool): State<DbPool>,
	session: Session,
	Path(id): Path<i32>,
	Json(request): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let profile = Profile::update_role(id, request.role, &conn).await?;

	info!(
		"profile {} gave profile {} the role {}",
		session.data.profile_id, id, request.role
	);

	Ok((StatusCode::OK, Json(profile)))
}

#[instrument(skip(pool))]
pub async fn reset_profile_role(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let profile = Profile::reset_role(id, &conn).await?;

	Ok((StatusCode::OK, Json(profile)))
}

#[instrument(skip(pool))]
pub async fn assign_profile_society(
	State(pool): State<DbPool>,
	Path(id): Path<i32>,
	Json(request): Json<AssignSocietyRequest>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let profile = Profile::assign_society(id, request.society_id, &conn).await?;

	Ok((StatusCode::OK, Json(profile)))
}
