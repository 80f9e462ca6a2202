//! Controllers for authorization

use axum::extract::State;
use axum::response::NoContent;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Cookie;
use common::{Error, RedisConn};

use crate::Config;
use crate::session::Session;

pub mod sso;

#[instrument(skip(config, r_conn, jar))]
pub(crate) async fn logout_profile(
	State(config): State<Config>,
	State(mut r_conn): State<RedisConn>,
	session: Session,
	jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, NoContent), Error> {
	Session::delete(session.id, &mut r_conn).await?;

	let access_token = Cookie::build(config.access_token_name).path("/");

	let jar = jar.remove(access_token);

	info!("logged out profile {}", session.data.profile_id);

	Ok((jar, NoContent))
}
