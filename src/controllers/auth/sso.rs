use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use common::{DbPool, Error, InternalServerError, OAuthError, RedisConn};
use models::{BlockedEmail, Profile, SignInClaims, check_email_domain};
use openidconnect::core::{CoreClient, CoreProviderMetadata, CoreResponseType};
use openidconnect::reqwest::blocking::{Client, ClientBuilder};
use openidconnect::reqwest::redirect::Policy;
use openidconnect::{
	AuthenticationFlow,
	AuthorizationCode,
	CsrfToken,
	IssuerUrl,
	Nonce,
	RedirectUrl,
	Scope,
};
use serde::Deserialize;
use time::Duration;

use crate::session::Session;
use crate::{Config, SsoConfig};

const GOOGLE_ISSUER: &str = "https://accounts.google.com";
const CSRF_COOKIE: &str = "csrf-token";
const NONCE_COOKIE: &str = "nonce-cookie";

#[must_use]
pub fn make_cookie(
	name: String,
	value: String,
	domain: String,
	lifespan: Duration,
) -> Cookie<'static> {
	let mut cookie = Cookie::new(name, value);

	cookie.set_domain(domain);
	cookie.set_max_age(lifespan);
	cookie.set_http_only(true);
	cookie.set_secure(true);
	cookie.set_same_site(SameSite::Lax);
	cookie.set_path("/");

	cookie
}

fn provider_error<E: std::fmt::Display>(err: E) -> Error {
	InternalServerError::IdentityProviderError(err.to_string()).into()
}

/// Discover the google provider, must run on a blocking thread
fn discover_google(
	config: &Config,
) -> Result<(Client, CoreProviderMetadata, RedirectUrl), Error> {
	let issuer_url = IssuerUrl::new(GOOGLE_ISSUER.to_string())?;

	let http_client = ClientBuilder::new()
		.redirect(Policy::none())
		.build()
		.map_err(provider_error)?;

	let provider_metadata =
		CoreProviderMetadata::discover(&issuer_url, &http_client)
			.map_err(provider_error)?;

	let callback_url = config.backend_url.join("auth/sso/callback")?;
	let redirect_url = RedirectUrl::new(callback_url.to_string())?;

	Ok((http_client, provider_metadata, redirect_url))
}

#[instrument(skip(config, sso_config, jar))]
pub async fn sso_login(
	State(config): State<Config>,
	State(sso_config): State<SsoConfig>,
	Path(provider): Path<String>,
	mut jar: PrivateCookieJar,
) -> Result<impl IntoResponse, Error> {
	if provider != "google" {
		return Err(OAuthError::UnknownProvider(provider).into());
	}

	let domain = config
		.backend_url
		.host_str()
		.ok_or_else(|| {
			Error::Infallible("backend url has no host".to_string())
		})?
		.to_string();

	let (auth_url, csrf_state, nonce) = tokio::task::block_in_place(|| {
		let (_, provider_metadata, redirect_url) = discover_google(&config)?;

		let client = CoreClient::from_provider_metadata(
			provider_metadata,
			sso_config.google_client_id,
			Some(sso_config.google_client_secret),
		)
		.set_redirect_uri(redirect_url);

		let data = client
			.authorize_url(
				AuthenticationFlow::<CoreResponseType>::AuthorizationCode,
				CsrfToken::new_random,
				Nonce::new_random,
			)
			.add_scope(Scope::new("openid".to_string()))
			.add_scope(Scope::new("email".to_string()))
			.add_scope(Scope::new("profile".to_string()))
			.url();

		Ok::<_, Error>(data)
	})?;

	let csrf_cookie = make_cookie(
		CSRF_COOKIE.into(),
		csrf_state.into_secret(),
		domain.clone(),
		Duration::seconds(120),
	);

	let nonce_cookie = make_cookie(
		NONCE_COOKIE.into(),
		nonce.secret().to_owned(),
		domain,
		Duration::seconds(120),
	);

	jar = jar.add(csrf_cookie);
	jar = jar.add(nonce_cookie);

	Ok((jar, Redirect::to(auth_url.as_ref())))
}

#[derive(Clone, Debug, Deserialize)]
pub struct OAuthResponse {
	pub code:  String,
	pub state: String,
}

#[instrument(skip(config, sso_config, pool, r_conn, jar))]
pub async fn sso_callback(
	State(config): State<Config>,
	State(sso_config): State<SsoConfig>,
	State(pool): State<DbPool>,
	State(mut r_conn): State<RedisConn>,
	Query(query): Query<OAuthResponse>,
	mut jar: PrivateCookieJar,
) -> Result<impl IntoResponse, Error> {
	let csrf_cookie =
		jar.get(CSRF_COOKIE).ok_or(OAuthError::MissingCSRFTokenCookie)?;
	let nonce_cookie =
		jar.get(NONCE_COOKIE).ok_or(OAuthError::MissingNonceCookie)?;

	let csrf_token = csrf_cookie.value().to_owned();
	let nonce = nonce_cookie.value().to_owned();

	jar = jar.remove(csrf_cookie);
	jar = jar.remove(nonce_cookie);

	if csrf_token != query.state {
		return Err(OAuthError::InvalidCSRFToken.into());
	}

	let claims = tokio::task::block_in_place(|| {
		let (http_client, provider_metadata, redirect_url) =
			discover_google(&config)?;

		let client = CoreClient::from_provider_metadata(
			provider_metadata,
			sso_config.google_client_id,
			Some(sso_config.google_client_secret),
		)
		.set_redirect_uri(redirect_url);

		let token_response = client
			.exchange_code(AuthorizationCode::new(query.code))
			.map_err(provider_error)?
			.request(&http_client)
			.map_err(provider_error)?;

		let id_token_verifier = client.id_token_verifier();

		let id_token = token_response
			.extra_fields()
			.id_token()
			.ok_or_else(|| {
				provider_error("token response carries no id token")
			})?;

		let id_token_claims = id_token
			.claims(&id_token_verifier, &Nonce::new(nonce))
			.map_err(provider_error)?;

		let email = id_token_claims
			.email()
			.ok_or(OAuthError::MissingEmailField)?
			.as_str()
			.to_owned();

		let name = id_token_claims
			.name()
			.and_then(|n| n.get(None))
			.map(|n| n.as_str().to_owned());

		let image_url = id_token_claims
			.picture()
			.and_then(|p| p.get(None))
			.map(|p| p.as_str().to_owned());

		Ok::<_, Error>(SignInClaims { email, name, image_url })
	})?;

	check_email_domain(&claims.email, &config.allowed_email_domain)?;

	let conn = pool.get().await?;

	BlockedEmail::ensure_not_blocked(&claims.email, config.campus_now(), &conn)
		.await?;

	let profile = Profile::sign_in(claims, &conn).await?;

	let session =
		Session::create(config.access_token_lifetime, &profile, &mut r_conn)
			.await?;

	let access_token_cookie = session.to_access_token_cookie(
		config.access_token_name.clone(),
		config.access_token_lifetime,
		config.production,
	);

	let jar = jar.add(access_token_cookie);

	info!("logged in profile {} from google SSO", profile.id);

	let redirect_url = config.frontend_url.join("auth/sso")?;

	Ok((jar, Redirect::to(redirect_url.as_ref())))
}
