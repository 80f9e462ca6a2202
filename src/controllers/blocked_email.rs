use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{DbPool, Error};
use models::BlockedEmail;

use crate::Config;
use crate::schemas::blocked_email::{
	BlockEmailsRequest,
	BlockedCheckQuery,
	BlockedStatusResponse,
	UnblockEmailsRequest,
	UnblockEmailsResponse,
};
use crate::session::Session;

#[instrument(skip(pool))]
pub async fn get_blocked_emails(
	State(pool): State<DbPool>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let entries = BlockedEmail::get_all(&conn).await?;

	Ok((StatusCode::OK, Json(entries)))
}

#[instrument(skip(pool))]
pub async fn block_emails(
	State(pool): State<DbPool>,
	session: Session,
	Json(request): Json<BlockEmailsRequest>,
) -> Result<impl IntoResponse, Error> {
	let new_blocks = request.to_insertable(session.data.profile_id)?;

	let conn = pool.get().await?;

	let entries = new_blocks.insert(&conn).await?;

	Ok((StatusCode::CREATED, Json(entries)))
}

#[instrument(skip(pool))]
pub async fn unblock_emails(
	State(pool): State<DbPool>,
	Json(request): Json<UnblockEmailsRequest>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let unblocked = BlockedEmail::unblock(request.emails, &conn).await?;

	Ok((StatusCode::OK, Json(UnblockEmailsResponse { unblocked })))
}

#[instrument(skip(config, pool))]
pub async fn check_blocked_email(
	State(config): State<Config>,
	State(pool): State<DbPool>,
	Query(query): Query<BlockedCheckQuery>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let entry =
		BlockedEmail::check(&query.email, config.campus_now(), &conn).await?;

	Ok((StatusCode::OK, Json(BlockedStatusResponse::from(entry))))
}
