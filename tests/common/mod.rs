use axum::response::IntoResponse;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, Key};
use axum_test::TestServer;
use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use common::DbPool;
use models::{ConflictMode, Profile};
use openidconnect::{ClientId, ClientSecret};
use vault::session::Session;
use vault::{
	AppState,
	Config,
	SeedCourt,
	SeedProfile,
	Seeder,
	SsoConfig,
	routes,
};

mod mock_db;
mod mock_redis;

use mock_db::{DATABASE_PROVIDER, DatabaseGuard};
use mock_redis::{RedisUrlGuard, RedisUrlProvider};

pub const ADMIN_EMAIL: &str = "admin@iitbbs.ac.in";
pub const MANAGER_EMAIL: &str = "manager@iitbbs.ac.in";
pub const SECY_EMAIL: &str = "sports.secy@iitbbs.ac.in";
pub const STUDENT_EMAILS: [&str; 4] = [
	"student1@iitbbs.ac.in",
	"student2@iitbbs.ac.in",
	"student3@iitbbs.ac.in",
	"student4@iitbbs.ac.in",
];

/// Seeded court ids, in the order of `seed/courts.json`
pub const BADMINTON_1: i32 = 1;
pub const BADMINTON_2: i32 = 2;
pub const SQUASH: i32 = 3;
pub const TENNIS: i32 = 4;

#[allow(dead_code)]
pub struct TestEnv {
	pub app:         TestServer,
	pub state:       AppState,
	pub db_guard:    DatabaseGuard,
	pub redis_guard: RedisUrlGuard,
}

fn test_config() -> Config {
	Config {
		database_url:          std::env::var("DATABASE_URL").unwrap(),
		redis_url:             std::env::var("REDIS_URL").unwrap(),
		production:            false,
		backend_url:           "http://localhost/".parse().unwrap(),
		frontend_url:          "http://localhost:3000/".parse().unwrap(),
		access_token_name:     "vault_access_token".to_string(),
		access_token_lifetime: time::Duration::minutes(15),
		cookie_jar_key:        String::new(),
		allowed_email_domain:  "iitbbs.ac.in".to_string(),
		campus_utc_offset:     TimeDelta::minutes(330),
		late_threshold:        TimeDelta::minutes(15),
		slot_conflict_mode:    ConflictMode::ExactStart,
	}
}

async fn seed(pool: &DbPool) {
	let conn = pool.get().await.unwrap();
	let mut seeder = Seeder::new(&conn);

	seeder
		.populate("seed/profiles.json", async |conn, profiles| {
			for profile in profiles {
				SeedProfile::insert(profile, conn).await?;
			}

			Ok(())
		})
		.await
		.populate("seed/courts.json", async |conn, courts| {
			for court in courts {
				SeedCourt::insert(court, conn).await?;
			}

			Ok(())
		})
		.await;
}

#[allow(dead_code)]
impl TestEnv {
	/// Get a test environment with mocked resources for running tests
	///
	/// # Panics
	/// Panics if building a test server fails
	pub async fn new() -> Self { Self::with_config(test_config()).await }

	/// Get a test environment running with a given [`Config`]
	///
	/// # Panics
	/// Panics if building a test server fails
	pub async fn with_config(config: Config) -> Self {
		let db_guard = (*DATABASE_PROVIDER).acquire().await;
		let database_pool = db_guard.create_pool().await;

		seed(&database_pool).await;

		let redis_guard = RedisUrlProvider::acquire();
		let redis_connection = redis_guard.connect().await;

		let sso_config = SsoConfig {
			google_client_id:     ClientId::new("test-client".to_string()),
			google_client_secret: ClientSecret::new("test-secret".to_string()),
		};

		let state = AppState {
			config,
			sso_config,
			database_pool,
			redis_connection,
			cookie_jar_key: Key::from(&[0u8; 64]),
		};

		let app = routes::get_app_router(state.clone());

		let app = TestServer::builder().save_cookies().build(app).unwrap();

		TestEnv { app, state, db_guard, redis_guard }
	}

	/// Sign in as the seeded profile with the given email
	///
	/// Sessions are normally created by the SSO callback, here the session is
	/// stored directly and its access token is handed to the test client.
	pub async fn login(&mut self, email: &str) -> i32 {
		let conn = self.state.database_pool.get().await.unwrap();
		let profile =
			Profile::get_by_email(email, &conn).await.unwrap().unwrap();

		let mut r_conn = self.state.redis_connection.clone();
		let config = &self.state.config;

		let session =
			Session::create(config.access_token_lifetime, &profile, &mut r_conn)
				.await
				.unwrap();

		let cookie = session.to_access_token_cookie(
			config.access_token_name.clone(),
			config.access_token_lifetime,
			false,
		);

		// Let the private jar encrypt the cookie the same way a response would
		let key = self.state.cookie_jar_key.clone();
		let jar = PrivateCookieJar::new(key).add(cookie);
		let response = (jar, ()).into_response();

		let header = response
			.headers()
			.get(axum::http::header::SET_COOKIE)
			.unwrap()
			.to_str()
			.unwrap();

		let encrypted = Cookie::parse(header.to_string()).unwrap();

		self.app.clear_cookies();
		self.app.add_cookie(encrypted);

		profile.id
	}

	/// Connection to the test database
	pub async fn conn(&self) -> common::DbConn {
		self.state.database_pool.get().await.unwrap()
	}
}

/// The first given weekday strictly after today, in campus time
#[allow(dead_code)]
pub fn next_weekday(config: &Config, day: Weekday) -> NaiveDate {
	let mut date = config.campus_now().date() + TimeDelta::days(1);

	while date.weekday() != day {
		date += TimeDelta::days(1);
	}

	date
}
