use std::collections::HashSet;

use chrono::NaiveDateTime;
use common::{DbConn, Error};
use db::blocked_email;
use diesel::prelude::*;
use primitives::PrimitiveBlockedEmail;

use crate::normalize_email;

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = blocked_email)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct InsertableBlockedEmail {
	email:      String,
	start_time: NaiveDateTime,
	end_time:   NaiveDateTime,
	created_by: Option<i32>,
}

/// A request to block a set of emails for a time window
#[derive(Clone, Debug)]
pub struct NewBlockedEmails {
	pub emails:     Vec<String>,
	pub start_time: NaiveDateTime,
	pub end_time:   NaiveDateTime,
	pub created_by: Option<i32>,
}

impl NewBlockedEmails {
	/// Insert one entry per distinct email
	///
	/// # Errors
	/// Fails if the window does not end after it starts
	#[instrument(skip(conn))]
	pub async fn insert(
		self,
		conn: &DbConn,
	) -> Result<Vec<PrimitiveBlockedEmail>, Error> {
		if self.end_time <= self.start_time {
			return Err(Error::ValidationError(
				"a block must end after it starts".to_string(),
			));
		}

		let mut seen = HashSet::new();
		let emails: Vec<String> = self
			.emails
			.iter()
			.map(|e| normalize_email(e))
			.filter(|e| !e.is_empty() && seen.insert(e.clone()))
			.collect();

		let records: Vec<InsertableBlockedEmail> = emails
			.into_iter()
			.map(|email| {
				InsertableBlockedEmail {
					email,
					start_time: self.start_time,
					end_time: self.end_time,
					created_by: self.created_by,
				}
			})
			.collect();

		let blocked = conn
			.interact(move |conn| {
				use self::blocked_email::dsl::*;

				diesel::insert_into(blocked_email)
					.values(records)
					.returning(PrimitiveBlockedEmail::as_returning())
					.get_results(conn)
			})
			.await??;

		info!(
			"blocked {} emails until {}",
			blocked.len(),
			self.end_time
		);

		Ok(blocked)
	}
}

pub struct BlockedEmail;

impl BlockedEmail {
	/// Get all block entries, latest first
	#[instrument(skip(conn))]
	pub async fn get_all(
		conn: &DbConn,
	) -> Result<Vec<PrimitiveBlockedEmail>, Error> {
		let entries = conn
			.interact(|conn| {
				use self::blocked_email::dsl::*;

				blocked_email
					.order(created_at.desc())
					.select(PrimitiveBlockedEmail::as_select())
					.get_results(conn)
			})
			.await??;

		Ok(entries)
	}

	/// Remove the oldest block entry of every given email
	///
	/// Returns the emails that had an entry
	#[instrument(skip(conn))]
	pub async fn unblock(
		emails: Vec<String>,
		conn: &DbConn,
	) -> Result<Vec<String>, Error> {
		let emails: Vec<String> =
			emails.iter().map(|e| normalize_email(e)).collect();

		let removed = conn
			.interact(move |conn| {
				use self::blocked_email::dsl::*;

				let mut removed = vec![];

				for query_email in emails {
					let first: Option<i32> = blocked_email
						.filter(email.eq(&query_email))
						.order(id)
						.select(id)
						.first(conn)
						.optional()?;

					if let Some(entry_id) = first {
						diesel::delete(blocked_email.find(entry_id))
							.execute(conn)?;

						removed.push(query_email);
					}
				}

				Ok::<_, diesel::result::Error>(removed)
			})
			.await??;

		info!("unblocked {} emails", removed.len());

		Ok(removed)
	}

	/// Check whether an email is currently blocked
	///
	/// An expired entry is deleted on sight and does not block.
	#[instrument(skip(conn))]
	pub async fn check(
		query_email: &str,
		now: NaiveDateTime,
		conn: &DbConn,
	) -> Result<Option<PrimitiveBlockedEmail>, Error> {
		let query_email = normalize_email(query_email);

		let entry = conn
			.interact(move |conn| {
				use self::blocked_email::dsl::*;

				blocked_email
					.filter(email.eq(query_email))
					.order(id)
					.select(PrimitiveBlockedEmail::as_select())
					.first(conn)
					.optional()
			})
			.await??;

		let Some(entry) = entry else {
			return Ok(None);
		};

		if entry.is_expired(now) {
			let entry_id = entry.id;

			conn.interact(move |conn| {
				use self::blocked_email::dsl::*;

				diesel::delete(blocked_email.find(entry_id)).execute(conn)
			})
			.await??;

			debug!("removed expired block {} for {}", entry.id, entry.email);

			return Ok(None);
		}

		Ok(Some(entry))
	}

	/// Fail if an email is currently blocked
	///
	/// # Errors
	/// Fails with [`common::LoginError::Blocked`] while a block is active
	pub async fn ensure_not_blocked(
		email: &str,
		now: NaiveDateTime,
		conn: &DbConn,
	) -> Result<(), Error> {
		match Self::check(email, now, conn).await? {
			Some(entry) => {
				warn!("refused blocked email {}", entry.email);

				Err(common::LoginError::Blocked(entry.end_time).into())
			},
			None => Ok(()),
		}
	}
}
