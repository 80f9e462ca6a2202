use chrono::Utc;
use common::{CourtBookingError, DbConn, Error, LoginError};
use db::{ProfileRole, profile};
use diesel::prelude::*;
use primitives::PrimitiveProfile;
use serde::{Deserialize, Serialize};

use crate::normalize_email;

/// Data needed to insert a new [`PrimitiveProfile`]
#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = profile)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
	pub first_name: String,
	pub last_name:  String,
	pub email:      String,
	pub role:       ProfileRole,
	pub image_url:  Option<String>,
}

/// Identity claims handed over by the identity provider on sign-in
#[derive(Clone, Debug)]
pub struct SignInClaims {
	pub email:     String,
	pub name:      Option<String>,
	pub image_url: Option<String>,
}

/// Filters for listing profiles in the role administration view
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFilter {
	pub search: Option<String>,
	pub role:   Option<ProfileRole>,
}

/// Check that an email belongs to the allowed sign-in domain
///
/// # Errors
/// Fails with [`LoginError::DomainNotAllowed`] for any other domain
pub fn check_email_domain(
	email: &str,
	allowed: &str,
) -> Result<(), LoginError> {
	let allowed_domain = email
		.rsplit_once('@')
		.is_some_and(|(local, domain)| {
			!local.is_empty() && domain.eq_ignore_ascii_case(allowed)
		});

	if !allowed_domain {
		return Err(LoginError::DomainNotAllowed(email.to_string()));
	}

	Ok(())
}

/// The role given to a profile on its first sign-in
///
/// Society secretaries sign in with addresses containing `secy`.
#[must_use]
pub fn initial_role(email: &str) -> ProfileRole {
	if email.to_lowercase().contains("secy") {
		ProfileRole::Society
	} else {
		ProfileRole::Student
	}
}

/// Split a display name into a first name and the rest
#[must_use]
pub fn split_name(name: &str) -> (String, String) {
	let mut parts = name.split_whitespace();

	let first = parts.next().unwrap_or_default().to_string();
	let rest = parts.collect::<Vec<_>>().join(" ");

	(first, rest)
}

impl NewProfile {
	/// Build the profile created on the first sign-in of an email
	#[must_use]
	pub fn from_claims(claims: &SignInClaims) -> Self {
		let email = normalize_email(&claims.email);

		let (first_name, last_name) = match claims.name.as_deref() {
			Some(name) if !name.trim().is_empty() => split_name(name),
			_ => {
				let local = email.split('@').next().unwrap_or_default();
				(local.to_string(), String::new())
			},
		};

		Self {
			first_name,
			last_name,
			role: initial_role(&email),
			email,
			image_url: claims.image_url.clone(),
		}
	}

	/// Insert this [`NewProfile`]
	#[instrument(skip(conn))]
	pub async fn insert(
		self,
		conn: &DbConn,
	) -> Result<PrimitiveProfile, Error> {
		let profile = conn
			.interact(|conn| {
				use self::profile::dsl::*;

				diesel::insert_into(profile)
					.values(self)
					.returning(PrimitiveProfile::as_returning())
					.get_result(conn)
			})
			.await??;

		info!("created profile {} with role {}", profile.id, profile.role);

		Ok(profile)
	}
}

pub struct Profile;

impl Profile {
	/// Get a [`PrimitiveProfile`] given its id
	#[instrument(skip(conn))]
	pub async fn get(
		query_id: i32,
		conn: &DbConn,
	) -> Result<PrimitiveProfile, Error> {
		let profile = conn
			.interact(move |conn| {
				use self::profile::dsl::*;

				profile
					.find(query_id)
					.select(PrimitiveProfile::as_select())
					.get_result(conn)
			})
			.await??;

		Ok(profile)
	}

	/// Get a [`PrimitiveProfile`] given its email, if any
	#[instrument(skip(conn))]
	pub async fn get_by_email(
		query_email: &str,
		conn: &DbConn,
	) -> Result<Option<PrimitiveProfile>, Error> {
		let query_email = normalize_email(query_email);

		let profile = conn
			.interact(move |conn| {
				use self::profile::dsl::*;

				profile
					.filter(email.eq(query_email))
					.select(PrimitiveProfile::as_select())
					.first(conn)
					.optional()
			})
			.await??;

		Ok(profile)
	}

	/// Resolve a list of normalized emails to profiles, keeping their order
	///
	/// # Errors
	/// Fails with [`CourtBookingError::UnknownCompanion`] naming the
	/// first email without a profile
	#[instrument(skip(conn))]
	pub async fn resolve_emails(
		emails: Vec<String>,
		conn: &DbConn,
	) -> Result<Vec<PrimitiveProfile>, Error> {
		if emails.is_empty() {
			return Ok(vec![]);
		}

		let query_emails = emails.clone();

		let found = conn
			.interact(move |conn| {
				use self::profile::dsl::*;

				profile
					.filter(email.eq_any(query_emails))
					.select(PrimitiveProfile::as_select())
					.get_results(conn)
			})
			.await??;

		emails
			.into_iter()
			.map(|e| {
				found
					.iter()
					.find(|p| p.email == e)
					.cloned()
					.ok_or_else(|| {
						Error::from(CourtBookingError::UnknownCompanion(e))
					})
			})
			.collect()
	}

	/// Get or create the profile for a sign-in and record the login time
	#[instrument(skip(conn))]
	pub async fn sign_in(
		claims: SignInClaims,
		conn: &DbConn,
	) -> Result<PrimitiveProfile, Error> {
		let existing = Self::get_by_email(&claims.email, conn).await?;

		let profile = match existing {
			Some(p) => p,
			None => NewProfile::from_claims(&claims).insert(conn).await?,
		};

		Self::update_last_login(profile.id, conn).await
	}

	/// Set the `last_login_at` field to the current datetime
	#[instrument(skip(conn))]
	pub async fn update_last_login(
		query_id: i32,
		conn: &DbConn,
	) -> Result<PrimitiveProfile, Error> {
		let now = Utc::now().naive_utc();

		Self::update_with(query_id, conn, move |conn| {
			use self::profile::dsl::*;

			diesel::update(profile.find(query_id))
				.set(last_login_at.eq(now))
				.returning(PrimitiveProfile::as_returning())
				.get_result(conn)
		})
		.await
	}

	/// List profiles for the role administration view
	///
	/// A search term is matched against emails exactly, falling back to a
	/// role name when no email matches. Without a search term the role
	/// filter applies, and without either only Admin, Society and Council
	/// profiles are listed.
	#[instrument(skip(conn))]
	pub async fn search(
		filter: ProfileFilter,
		conn: &DbConn,
	) -> Result<Vec<PrimitiveProfile>, Error> {
		let search = filter
			.search
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty());

		if let Some(term) = search {
			let by_email = Self::get_by_email(&term, conn).await?;

			if let Some(profile) = by_email {
				return Ok(vec![profile]);
			}

			return match term.parse::<ProfileRole>() {
				Ok(r) => Self::get_by_roles(vec![r], conn).await,
				Err(_) => Ok(vec![]),
			};
		}

		let roles = match filter.role {
			Some(r) => vec![r],
			None => ProfileRole::PRIVILEGED.to_vec(),
		};

		Self::get_by_roles(roles, conn).await
	}

	#[instrument(skip(conn))]
	async fn get_by_roles(
		roles: Vec<ProfileRole>,
		conn: &DbConn,
	) -> Result<Vec<PrimitiveProfile>, Error> {
		let profiles = conn
			.interact(move |conn| {
				use self::profile::dsl::*;

				profile
					.filter(role.eq_any(roles))
					.order(id)
					.select(PrimitiveProfile::as_select())
					.get_results(conn)
			})
			.await??;

		Ok(profiles)
	}

	/// Give a profile a new role, remembering the role it had before the
	/// first change
	#[instrument(skip(conn))]
	pub async fn update_role(
		query_id: i32,
		new_role: ProfileRole,
		conn: &DbConn,
	) -> Result<PrimitiveProfile, Error> {
		let current = Self::get(query_id, conn).await?;
		let remembered = current.original_role.unwrap_or(current.role);

		let updated = Self::update_with(query_id, conn, move |conn| {
			use self::profile::dsl::*;

			diesel::update(profile.find(query_id))
				.set((role.eq(new_role), original_role.eq(Some(remembered))))
				.returning(PrimitiveProfile::as_returning())
				.get_result(conn)
		})
		.await?;

		info!("changed role of profile {query_id} to {new_role}");

		Ok(updated)
	}

	/// Restore the role a profile had before it was changed and unlink it
	/// from any society
	#[instrument(skip(conn))]
	pub async fn reset_role(
		query_id: i32,
		conn: &DbConn,
	) -> Result<PrimitiveProfile, Error> {
		let current = Self::get(query_id, conn).await?;
		let restored = current.original_role.unwrap_or(current.role);

		let updated = Self::update_with(query_id, conn, move |conn| {
			use self::profile::dsl::*;

			diesel::update(profile.find(query_id))
				.set((
					role.eq(restored),
					original_role.eq(None::<ProfileRole>),
					society_id.eq(None::<i32>),
				))
				.returning(PrimitiveProfile::as_returning())
				.get_result(conn)
		})
		.await?;

		info!("reset role of profile {query_id} to {restored}");

		Ok(updated)
	}

	/// Let a profile act on behalf of a society profile
	#[instrument(skip(conn))]
	pub async fn assign_society(
		query_id: i32,
		new_society_id: i32,
		conn: &DbConn,
	) -> Result<PrimitiveProfile, Error> {
		let current = Self::get(query_id, conn).await?;

		if current.society_id == Some(new_society_id) {
			return Ok(current);
		}

		let society = Self::get(new_society_id, conn).await?;

		if society.role != ProfileRole::Society {
			return Err(Error::ValidationError(format!(
				"profile {new_society_id} is not a society"
			)));
		}

		let updated = Self::update_with(query_id, conn, move |conn| {
			use self::profile::dsl::*;

			diesel::update(profile.find(query_id))
				.set(society_id.eq(Some(new_society_id)))
				.returning(PrimitiveProfile::as_returning())
				.get_result(conn)
		})
		.await?;

		info!("assigned society {new_society_id} to profile {query_id}");

		Ok(updated)
	}

	async fn update_with<F>(
		query_id: i32,
		conn: &DbConn,
		f: F,
	) -> Result<PrimitiveProfile, Error>
	where
		F: FnOnce(&mut PgConnection) -> QueryResult<PrimitiveProfile>
			+ Send
			+ 'static,
	{
		let updated = conn.interact(f).await?.map_err(|e| {
			match e {
				diesel::result::Error::NotFound => {
					Error::NotFound(format!("profile {query_id}"))
				},
				e => e.into(),
			}
		})?;

		Ok(updated)
	}
}
