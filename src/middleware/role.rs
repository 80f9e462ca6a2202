use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use common::Error;
use db::ProfileRole;
use models::Profile;
use tower::{Layer, Service};

use crate::{AppState, ProfileId};

/// Middleware layer that only lets profiles with one of the given roles
/// through
///
/// Must be layered inside an [`AuthLayer`](super::AuthLayer). The role is read
/// from the database so role changes apply without signing in again.
#[derive(Clone)]
pub struct RoleLayer {
	state: AppState,
	roles: &'static [ProfileRole],
}

impl RoleLayer {
	#[must_use]
	pub fn new(state: AppState, roles: &'static [ProfileRole]) -> Self {
		Self { state, roles }
	}
}

impl<S> Layer<S> for RoleLayer {
	type Service = RoleMiddleware<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RoleMiddleware { inner, state: self.state.clone(), roles: self.roles }
	}
}

#[derive(Clone)]
pub struct RoleMiddleware<S> {
	inner: S,
	state: AppState,
	roles: &'static [ProfileRole],
}

impl<S> Service<Request<Body>> for RoleMiddleware<S>
where
	S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Error = S::Error;
	type Future = Pin<
		Box<
			dyn Future<Output = Result<Self::Response, Self::Error>>
				+ Send
				+ 'static,
		>,
	>;
	type Response = S::Response;

	fn poll_ready(
		&mut self,
		cx: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	#[instrument(skip_all)]
	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let cloned_inner = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, cloned_inner);

		let state = self.state.clone();
		let roles = self.roles;

		Box::pin(async move {
			let Some(&profile_id) = req.extensions().get::<ProfileId>() else {
				debug!("profile id not found in request extensions");

				return Ok(Error::Forbidden.into_response());
			};

			let conn = match state.database_pool.get().await {
				Ok(conn) => conn,
				Err(e) => return Ok(Error::from(e).into_response()),
			};

			let profile = match Profile::get(*profile_id, &conn).await {
				Ok(p) => p,
				Err(e) => return Ok(e.into_response()),
			};

			if !roles.contains(&profile.role) {
				debug!(
					"profile {} with role {} was refused",
					profile_id, profile.role
				);

				return Ok(Error::Forbidden.into_response());
			}

			inner.call(req).await
		})
	}
}
