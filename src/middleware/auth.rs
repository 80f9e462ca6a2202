//! Access token check in front of every signed-in route

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::RequestExt;
use axum::body::Body;
use axum::extract::Request;
use axum::http::Response;
use axum::response::IntoResponse;
use axum_extra::extract::PrivateCookieJar;
use common::{Error, TokenError};
use tower::{Layer, Service};

use crate::session::Session;
use crate::{AppState, ProfileId};

/// Only lets requests through whose access token names a live session
///
/// Accepted requests carry the caller's `ProfileId` as a request
/// extension. Handlers take a [`Session`] to load the cached profile data.
#[derive(Clone)]
pub struct AuthLayer {
	state: AppState,
}

impl AuthLayer {
	#[must_use]
	pub fn new(state: AppState) -> Self { Self { state } }
}

impl<S> Layer<S> for AuthLayer {
	type Service = AuthMiddleware<S>;

	fn layer(&self, inner: S) -> Self::Service {
		AuthMiddleware { inner, state: self.state.clone() }
	}
}

#[derive(Clone)]
pub struct AuthMiddleware<S> {
	inner: S,
	state: AppState,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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
	fn call(&mut self, mut req: Request<Body>) -> Self::Future {
		let cloned_inner = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, cloned_inner);

		let state = self.state.clone();

		Box::pin(async move {
			let Ok(jar) = req
				.extract_parts_with_state::<PrivateCookieJar, _>(&state)
				.await;

			let token = jar
				.get(&state.config.access_token_name)
				.map(|cookie| cookie.value().parse::<i32>());

			let missing_token =
				|| Error::from(TokenError::MissingAccessToken).into_response();

			let profile_id = match token {
				Some(Ok(profile_id)) => profile_id,
				Some(Err(_)) => {
					warn!("access token does not hold a profile id");

					return Ok(missing_token());
				},
				None => {
					info!("request without access token");

					return Ok(missing_token());
				},
			};

			let mut r_conn = state.redis_connection;

			match Session::exists(profile_id, &mut r_conn).await {
				Ok(true) => {},
				Ok(false) => {
					warn!("no live session for profile {profile_id}");

					return Ok(
						Error::from(TokenError::MissingSession).into_response()
					);
				},
				Err(e) => return Ok(e.into_response()),
			}

			req.extensions_mut().insert(ProfileId(profile_id));

			inner.call(req).await
		})
	}
}
