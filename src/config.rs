use chrono::{TimeDelta, Utc};
use common::{DbPool, RedisConn};
use deadpool_diesel::postgres::{Manager, Pool};
use models::ConflictMode;
use openidconnect::{ClientId, ClientSecret};
use url::Url;

#[derive(Clone, Debug)]
pub struct Config {
	pub database_url: String,
	pub redis_url:    String,

	pub production:   bool,
	pub backend_url:  Url,
	pub frontend_url: Url,

	pub access_token_name:     String,
	pub access_token_lifetime: time::Duration,

	pub cookie_jar_key: String,

	pub allowed_email_domain: String,
	pub campus_utc_offset:    TimeDelta,
	pub late_threshold:       TimeDelta,
	pub slot_conflict_mode:   ConflictMode,
}

#[derive(Clone, Debug)]
pub struct SsoConfig {
	pub google_client_id:     ClientId,
	pub google_client_secret: ClientSecret,
}

fn get_env_var(var: &str) -> String {
	std::env::var(var).unwrap_or_else(|_| panic!("{var} must be set"))
}

fn get_env_var_or(var: &str, default: &str) -> String {
	std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_env_var<T: std::str::FromStr>(var: &str, value: &str) -> T {
	value.parse::<T>().unwrap_or_else(|_| panic!("{var} is invalid: '{value}'"))
}

impl Config {
	/// Create a new [`Config`] from environment variables
	///
	/// # Panics
	/// Panics if an environment variable is missing or invalid
	#[must_use]
	pub fn from_env() -> Self {
		let database_url = get_env_var("DATABASE_URL");
		let redis_url = get_env_var("REDIS_URL");

		let production = get_env_var_or("PRODUCTION", "false");
		let production = parse_env_var::<bool>("PRODUCTION", &production);

		let backend_url = get_env_var("BACKEND_URL");
		let backend_url = parse_env_var::<Url>("BACKEND_URL", &backend_url);
		let frontend_url = get_env_var("FRONTEND_URL");
		let frontend_url = parse_env_var::<Url>("FRONTEND_URL", &frontend_url);

		let access_token_name = get_env_var("ACCESS_TOKEN_NAME");
		let access_token_lifetime =
			get_env_var("ACCESS_TOKEN_LIFETIME_MINUTES");
		let access_token_lifetime = time::Duration::minutes(parse_env_var(
			"ACCESS_TOKEN_LIFETIME_MINUTES",
			&access_token_lifetime,
		));

		let cookie_jar_key = get_env_var("COOKIE_JAR_KEY");

		let allowed_email_domain =
			get_env_var_or("ALLOWED_EMAIL_DOMAIN", "iitbbs.ac.in");

		let campus_utc_offset =
			get_env_var_or("CAMPUS_UTC_OFFSET_MINUTES", "330");
		let campus_utc_offset = TimeDelta::minutes(parse_env_var(
			"CAMPUS_UTC_OFFSET_MINUTES",
			&campus_utc_offset,
		));

		let late_threshold = get_env_var_or("LATE_THRESHOLD_MINUTES", "15");
		let late_threshold = TimeDelta::minutes(parse_env_var(
			"LATE_THRESHOLD_MINUTES",
			&late_threshold,
		));

		let slot_conflict_mode =
			get_env_var_or("SLOT_CONFLICT_MODE", "exact-start");
		let slot_conflict_mode = parse_env_var::<ConflictMode>(
			"SLOT_CONFLICT_MODE",
			&slot_conflict_mode,
		);

		Self {
			database_url,
			redis_url,
			production,
			backend_url,
			frontend_url,
			access_token_name,
			access_token_lifetime,
			cookie_jar_key,
			allowed_email_domain,
			campus_utc_offset,
			late_threshold,
			slot_conflict_mode,
		}
	}

	/// The current wall-clock time on campus
	#[must_use]
	pub fn campus_now(&self) -> chrono::NaiveDateTime {
		Utc::now().naive_utc() + self.campus_utc_offset
	}

	/// Create a database pool for the given config
	///
	/// # Panics
	/// Panics if creating the pool fails
	#[must_use]
	pub fn create_database_pool(&self) -> DbPool {
		let manager = Manager::new(
			self.database_url.to_string(),
			deadpool_diesel::Runtime::Tokio1,
		);

		Pool::builder(manager).build().unwrap()
	}

	/// Create a redis connection for the given config
	///
	/// # Panics
	/// Panics if creating the connection fails
	pub async fn create_redis_connection(&self) -> RedisConn {
		let client = redis::Client::open(self.redis_url.to_string()).unwrap();

		client.get_multiplexed_async_connection().await.unwrap()
	}
}

impl SsoConfig {
	/// Create a new [`SsoConfig`] from environment variables
	///
	/// # Panics
	/// Panics if an environment variable is missing
	#[must_use]
	pub fn from_env() -> Self {
		let google_client_id = ClientId::new(get_env_var("GOOGLE_CLIENT_ID"));
		let google_client_secret =
			ClientSecret::new(get_env_var("GOOGLE_CLIENT_SECRET"));

		Self { google_client_id, google_client_secret }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn env_values_parse() {
		assert!(parse_env_var::<bool>("PRODUCTION", "true"));
		assert_eq!(parse_env_var::<i64>("LATE_THRESHOLD_MINUTES", "15"), 15);
		assert_eq!(
			parse_env_var::<ConflictMode>("SLOT_CONFLICT_MODE", "overlap"),
			ConflictMode::Overlap
		);
	}

	#[test]
	#[should_panic(expected = "SLOT_CONFLICT_MODE is invalid")]
	fn bad_conflict_mode_panics() {
		let _ = parse_env_var::<ConflictMode>("SLOT_CONFLICT_MODE", "fuzzy");
	}
}
