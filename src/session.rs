//! Signed-in profiles and their access token cookies
//!
//! A profile holds at most one session. It is cached in Redis under
//! `session:<profile id>`, and the access token cookie carries the profile
//! id.

use axum::RequestPartsExt;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite};
use common::{Error, InternalServerError, RedisConn};
use db::ProfileRole;
use primitives::PrimitiveProfile;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{AppState, ProfileId};

/// Seconds the cached session outlives its cookie
const CACHE_GRACE_SECONDS: i64 = 10;

/// Redis key of the session belonging to a profile
fn cache_key(profile_id: i32) -> String { format!("session:{profile_id}") }

/// A signed-in profile, available to any handler behind the auth layer
#[derive(Clone, Copy, Debug)]
pub struct Session {
	pub id:   i32,
	pub data: SessionData,
}

/// What gets cached for a session
///
/// The role is the one at sign-in. [`RoleLayer`](crate::middleware::RoleLayer)
/// reads the current role from the database.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct SessionData {
	pub profile_id:   i32,
	pub profile_role: ProfileRole,
}

impl FromRequestParts<AppState> for Session {
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let Some(ProfileId(profile_id)) =
			parts.extensions.get::<ProfileId>().copied()
		else {
			return Err(InternalServerError::SessionWithoutAuthError.into());
		};

		let State(mut conn) = parts
			.extract_with_state::<State<RedisConn>, AppState>(state)
			.await
			.map_err(|_| Error::InternalServerError)?;

		// The auth layer saw this session a moment ago
		Self::get(profile_id, &mut conn).await?.ok_or_else(|| {
			Error::Infallible(format!(
				"session of profile {profile_id} vanished after authorization"
			))
		})
	}
}

impl Session {
	/// Sign a profile in, replacing any session it already had
	#[instrument(skip(conn))]
	pub async fn create(
		lifetime: Duration,
		profile: &PrimitiveProfile,
		conn: &mut RedisConn,
	) -> Result<Self, Error> {
		let data =
			SessionData { profile_id: profile.id, profile_role: profile.role };

		let payload = serde_json::to_string(&data)
			.map_err(InternalServerError::SerdeJsonError)?;

		let ttl = lifetime.whole_seconds() + CACHE_GRACE_SECONDS;
		let ttl = u64::try_from(ttl).unwrap_or_default();

		let () = conn.set_ex(cache_key(profile.id), payload, ttl).await?;

		debug!("cached session for profile {} ({ttl}s)", profile.id);

		Ok(Self { id: profile.id, data })
	}

	#[instrument(skip(conn))]
	pub async fn get(
		profile_id: i32,
		conn: &mut RedisConn,
	) -> Result<Option<Self>, Error> {
		let payload: Option<String> = conn.get(cache_key(profile_id)).await?;

		payload
			.map(|payload| {
				let data = serde_json::from_str(&payload)
					.map_err(InternalServerError::SerdeJsonError)?;

				Ok(Self { id: profile_id, data })
			})
			.transpose()
	}

	/// Sign a profile out
	#[instrument(skip(conn))]
	pub async fn delete(
		profile_id: i32,
		conn: &mut RedisConn,
	) -> Result<(), Error> {
		let _: i32 = conn.del(cache_key(profile_id)).await?;

		Ok(())
	}

	#[instrument(skip(conn))]
	pub async fn exists(
		profile_id: i32,
		conn: &mut RedisConn,
	) -> Result<bool, Error> {
		let found: bool = conn.exists(cache_key(profile_id)).await?;

		Ok(found)
	}

	/// The HTTP-only cookie that identifies this session
	#[must_use]
	pub fn to_access_token_cookie(
		self,
		name: String,
		lifetime: Duration,
		secure: bool,
	) -> Cookie<'static> {
		Cookie::build((name, self.id.to_string()))
			.http_only(true)
			.max_age(lifetime)
			.path("/")
			.same_site(SameSite::Lax)
			.secure(secure)
			.into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn session(profile_id: i32) -> Session {
		Session {
			id:   profile_id,
			data: SessionData {
				profile_id,
				profile_role: ProfileRole::Student,
			},
		}
	}

	#[test]
	fn sessions_live_under_their_own_prefix() {
		assert_eq!(cache_key(42), "session:42");
	}

	#[test]
	fn access_token_cookie_carries_the_profile_id() {
		let cookie = session(7).to_access_token_cookie(
			"vault_access_token".to_string(),
			Duration::hours(1),
			true,
		);

		assert_eq!(cookie.name(), "vault_access_token");
		assert_eq!(cookie.value(), "7");
		assert_eq!(cookie.max_age(), Some(Duration::hours(1)));
		assert_eq!(cookie.path(), Some("/"));
		assert_eq!(cookie.http_only(), Some(true));
		assert_eq!(cookie.secure(), Some(true));
		assert_eq!(cookie.same_site(), Some(SameSite::Lax));
	}
}
