mod util;

use std::collections::HashSet;
use std::env;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc, Weekday};
use clap::{Error, Parser};
use common::DbConn;
use db::{CourtBookingStatus, ProfileRole, court_booking};
use deadpool_diesel::postgres::{Manager, Pool};
use diesel::prelude::*;
use fake::Fake;
use fake::faker::address::raw::StreetName;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use models::{Court, NewCourt, NewProfile, OpenWindow, WeeklySchedule};
use primitives::PrimitiveCourt;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, rng};

use crate::util::{batch_insert, generate_unique_set, io_error};

const EMAIL_DOMAIN: &str = "iitbbs.ac.in";

/// Court types as (type, label, minimum users, slot length in hours)
const COURT_TYPES: [(&str, &str, i32, f64); 5] = [
	("badminton", "Badminton Court", 2, 1.0),
	("squash", "Squash Court", 1, 0.5),
	("tennis", "Tennis Court", 4, 1.5),
	("table-tennis", "Table Tennis Table", 2, 0.5),
	("basketball", "Basketball Court", 6, 1.0),
];

const WEEKDAYS: [Weekday; 5] =
	[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];

#[derive(Parser, Debug)]
struct Opt {
	#[arg(long, short = 'p', default_value_t = 1_000)]
	profiles: usize,
	#[arg(long, short = 'c', default_value_t = 20)]
	courts:   usize,
	/// Finished bookings spread over the past weeks
	#[arg(long, short = 'b', default_value_t = 2_000)]
	bookings: usize,
}

#[derive(Insertable)]
#[diesel(table_name = court_booking)]
struct SeedBooking {
	court_id:       i32,
	court_name:     String,
	start_time:     NaiveDateTime,
	end_time:       NaiveDateTime,
	status:         CourtBookingStatus,
	requested_user: i32,
	court_type:     String,
	punched_in_at:  Option<NaiveDateTime>,
	punched_out_at: Option<NaiveDateTime>,
	created_at:     NaiveDateTime,
	updated_at:     NaiveDateTime,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	let cli = Opt::parse();
	let conn = get_conn().await;

	if cli.profiles > 0 {
		println!("Seeding {} profiles…", cli.profiles);
		let inserted = seed_profiles(&conn, cli.profiles).await?;
		println!("Inserted {inserted} student profiles");
	}

	if cli.courts > 0 {
		println!("Seeding {} courts…", cli.courts);
		let inserted = seed_courts(&conn, cli.courts).await?;
		println!("Inserted {inserted} courts");
	}

	if cli.bookings > 0 {
		println!("Seeding {} bookings…", cli.bookings);
		let inserted = seed_bookings(&conn, cli.bookings).await?;
		println!("Inserted {inserted} past bookings");
	}

	Ok(())
}

/// Get a database connection from the pool
async fn get_conn() -> DbConn {
	let database_url = env::var("DATABASE_URL").expect("DATABASE_URL missing");

	let manager = Manager::new(database_url, deadpool_diesel::Runtime::Tokio1);
	let pool = Pool::builder(manager).build().expect("Failed to create pool");

	pool.get().await.expect("Failed to get a database connection")
}

/// Seed student profiles with unique campus emails
async fn seed_profiles(conn: &DbConn, count: usize) -> Result<usize, Error> {
	let locals = generate_unique_set(count, || {
		format!(
			"{}.{}",
			FirstName(EN).fake::<String>(),
			LastName(EN).fake::<String>()
		)
	});

	let profiles: Vec<NewProfile> = locals
		.into_iter()
		.map(|local| {
			let first_name = FirstName(EN).fake::<String>();
			let last_name = LastName(EN).fake::<String>();

			NewProfile {
				first_name,
				last_name,
				email: format!("{local}@{EMAIL_DOMAIN}"),
				role: ProfileRole::Student,
				image_url: None,
			}
		})
		.collect();

	batch_insert(conn, profiles, 8192, |conn, chunk| {
		use db::profile::dsl::*;
		diesel::insert_into(profile).values(chunk).execute(conn)
	})
	.await
}

/// A random weekly schedule, every court opens on weekday evenings
fn random_schedule(rng: &mut impl Rng) -> Result<WeeklySchedule, Error> {
	let window = |s: &str| s.parse::<OpenWindow>().map_err(io_error);

	let morning = window("06:00-08:00")?;
	let evening = window("17:00-21:00")?;
	let weekend = window("07:00-12:00")?;

	let mut schedule = WeeklySchedule::default();

	for day in WEEKDAYS {
		let windows = if rng.random_bool(0.5) {
			vec![morning, evening]
		} else {
			vec![evening]
		};

		schedule = schedule.with_day(day, windows);
	}

	if rng.random_bool(0.7) {
		schedule = schedule
			.with_day(Weekday::Sat, vec![weekend])
			.with_day(Weekday::Sun, vec![weekend]);
	}

	Ok(schedule)
}

/// Seed courts of every type, numbered after the courts already present
async fn seed_courts(conn: &DbConn, count: usize) -> Result<usize, Error> {
	let existing: i64 = conn
		.interact(|c| {
			use db::court::dsl::*;
			court.count().get_result(c)
		})
		.await
		.map_err(io_error)?
		.map_err(io_error)?;

	let mut rng = rng();

	let courts = (0..count)
		.map(|i| {
			let (court_type, label, min_users, max_time) =
				COURT_TYPES[i % COURT_TYPES.len()];
			let number = existing + 1 + i64::try_from(i).unwrap_or_default();
			let street = StreetName(EN).fake_with_rng::<String, _>(&mut rng);

			Ok(NewCourt {
				name: format!("{label} {number}"),
				image: None,
				location: format!("Sports Complex, {street}"),
				court_type: court_type.to_string(),
				min_users,
				max_time,
				time_slots: random_schedule(&mut rng)?.to_text(),
			})
		})
		.collect::<Result<Vec<_>, Error>>()?;

	batch_insert(conn, courts, 1024, |conn, chunk| {
		use db::court::dsl::*;
		diesel::insert_into(court).values(chunk).execute(conn)
	})
	.await
}

/// Seed finished bookings on past dates, each with enough companions and no
/// slot booked twice
async fn seed_bookings(conn: &DbConn, count: usize) -> Result<usize, Error> {
	let (profile_ids, courts) = conn
		.interact(|c| {
			let profile_ids: Vec<i32> = db::profile::table
				.filter(db::profile::role.eq(ProfileRole::Student))
				.select(db::profile::id)
				.load(c)?;

			let courts: Vec<PrimitiveCourt> = db::court::table
				.select(PrimitiveCourt::as_select())
				.load(c)?;

			Ok::<_, diesel::result::Error>((profile_ids, courts))
		})
		.await
		.map_err(io_error)?
		.map_err(io_error)?;

	let courts: Vec<Court> = courts
		.into_iter()
		.filter_map(|c| Court::try_from(c).ok())
		.collect();

	assert!(
		!profile_ids.is_empty(),
		"No student profiles exist to book courts"
	);
	assert!(!courts.is_empty(), "No courts exist to book");

	let today = Utc::now().date_naive();
	let mut rng = rng();
	let mut taken = HashSet::new();
	let mut bookings: Vec<(SeedBooking, Vec<i32>)> = Vec::with_capacity(count);

	// Give up on crowded databases instead of looping forever
	let mut attempts = count * 10;

	while bookings.len() < count && attempts > 0 {
		attempts -= 1;

		let Some(court) = courts.choose(&mut rng) else {
			break;
		};

		let date: NaiveDate = today - TimeDelta::days(rng.random_range(1..=60));

		let Some(slot) = court.slots_on(date).choose(&mut rng).copied() else {
			continue;
		};

		if !taken.insert((court.primitive.id, date, slot.start)) {
			continue;
		}

		let required = court.required_companions();

		if profile_ids.len() <= required {
			continue;
		}

		let mut participants: Vec<i32> = profile_ids
			.choose_multiple(&mut rng, required + 1)
			.copied()
			.collect();
		participants.shuffle(&mut rng);

		let requested_user = participants[0];
		let companions = participants[1..].to_vec();

		let (start_time, end_time) = Court::slot_span(date, slot);

		let (status, punched_in_at, punched_out_at) = if rng.random_bool(0.8) {
			let delay = TimeDelta::minutes(rng.random_range(0..10));
			let punch_in = start_time + delay;
			(CourtBookingStatus::PunchedOut, Some(punch_in), Some(end_time))
		} else {
			(CourtBookingStatus::Late, None, None)
		};

		bookings.push((
			SeedBooking {
				court_id: court.primitive.id,
				court_name: court.primitive.name.clone(),
				start_time,
				end_time,
				status,
				requested_user,
				court_type: court.primitive.court_type.clone(),
				punched_in_at,
				punched_out_at,
				created_at: start_time - TimeDelta::days(1),
				updated_at: end_time,
			},
			companions,
		));
	}

	let mut total = 0;

	while !bookings.is_empty() {
		let chunk: Vec<_> = bookings.drain(..512.min(bookings.len())).collect();

		total += conn
			.interact(move |c| {
				c.transaction(|c| {
					for (booking, companions) in &chunk {
						insert_booking(c, booking, companions)?;
					}

					Ok::<_, diesel::result::Error>(chunk.len())
				})
			})
			.await
			.map_err(io_error)?
			.map_err(io_error)?;

		println!("Inserted {total} bookings");
	}

	Ok(total)
}

/// Insert one booking together with its companions
fn insert_booking(
	conn: &mut PgConnection,
	booking: &SeedBooking,
	companions: &[i32],
) -> QueryResult<()> {
	use db::court_booking_companion::dsl::*;

	let booking_id: i32 = diesel::insert_into(court_booking::table)
		.values(booking)
		.returning(court_booking::id)
		.get_result(conn)?;

	let rows: Vec<_> = companions
		.iter()
		.map(|p| (court_booking_id.eq(booking_id), profile_id.eq(*p)))
		.collect();

	diesel::insert_into(court_booking_companion).values(rows).execute(conn)?;

	Ok(())
}
