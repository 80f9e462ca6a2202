use std::path::PathBuf;

use common::{DbConn, Error};
use db::{ProfileRole, court, profile};
use diesel::prelude::*;
use models::{NewCourt, WeeklySchedule, validate_court_fields};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub struct Seeder<'c> {
	connection: &'c DbConn,
}

impl<'c> Seeder<'c> {
	pub fn new(connection: &'c DbConn) -> Self { Self { connection } }

	/// Read a file into a series of deserializable items
	///
	/// # Panics
	/// Panics if reading or deserializing the file fails
	fn read_file_records<T, I>(filename: &str) -> I
	where
		T: DeserializeOwned,
		I: IntoIterator<Item = T> + DeserializeOwned,
	{
		let path = std::env::var("CARGO_MANIFEST_DIR")
			.map(PathBuf::from)
			.unwrap_or_default()
			.join(filename);

		let s = std::fs::read_to_string(path)
			.unwrap_or_else(|_| panic!("COULD NOT READ SEED FILE {filename}"));

		serde_json::from_str(&s)
			.unwrap_or_else(|_| panic!("COULD NOT MAP SEED FILE {filename}"))
	}

	/// Load a file and populate the database with it
	///
	/// # Panics
	/// Panics if reading the file or interacting with the database fails
	pub async fn populate<'s, T, F>(
		&'s mut self,
		filename: &str,
		loader: F,
	) -> &'s mut Self
	where
		T: DeserializeOwned + std::fmt::Debug,
		F: AsyncFnOnce(&DbConn, Vec<T>) -> Result<(), Error>,
	{
		let records = Self::read_file_records(filename);

		loader(self.connection, records).await.unwrap_or_else(|e| {
			panic!("COULD NOT LOAD RECORDS FOR {filename}: {e}")
		});

		info!("seeded database from {filename}");

		self
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProfile {
	pub first_name: String,
	pub last_name:  String,
	pub email:      String,
	#[serde(default)]
	pub role:       ProfileRole,
}

#[derive(AsChangeset, Clone, Debug, Insertable)]
#[diesel(table_name = profile)]
struct InsertableSeedProfile {
	first_name: String,
	last_name:  String,
	email:      String,
	role:       ProfileRole,
}

impl SeedProfile {
	/// Insert this [`SeedProfile`], overwriting a profile with the same email
	pub async fn insert(self, conn: &DbConn) -> Result<(), Error> {
		let insertable = InsertableSeedProfile {
			first_name: self.first_name,
			last_name:  self.last_name,
			email:      self.email.trim().to_lowercase(),
			role:       self.role,
		};

		conn.interact(|conn| {
			use self::profile::dsl::*;

			diesel::insert_into(profile)
				.values(insertable.clone())
				.on_conflict(email)
				.do_update()
				.set(insertable)
				.execute(conn)
		})
		.await??;

		Ok(())
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCourt {
	pub name:       String,
	pub image:      Option<String>,
	pub location:   String,
	pub court_type: String,
	pub min_users:  i32,
	pub max_time:   f64,
	pub time_slots: WeeklySchedule,
}

impl SeedCourt {
	/// Insert this [`SeedCourt`], overwriting a court with the same name
	pub async fn insert(self, conn: &DbConn) -> Result<(), Error> {
		let insertable = NewCourt {
			name:       self.name,
			image:      self.image,
			location:   self.location,
			court_type: self.court_type,
			min_users:  self.min_users,
			max_time:   self.max_time,
			time_slots: self.time_slots.to_text(),
		};

		validate_court_fields(
			Some(insertable.min_users),
			Some(insertable.max_time),
			Some(&insertable.time_slots),
		)?;

		conn.interact(|conn| {
			use self::court::dsl::*;

			diesel::insert_into(court)
				.values(insertable.clone())
				.on_conflict(name)
				.do_update()
				.set((
					location.eq(insertable.location),
					court_type.eq(insertable.court_type),
					min_users.eq(insertable.min_users),
					max_time.eq(insertable.max_time),
					time_slots.eq(insertable.time_slots),
				))
				.execute(conn)
		})
		.await??;

		Ok(())
	}
}
