use std::collections::HashSet;
use std::fmt::Display;

use clap::Error;
use clap::error::ErrorKind;
use common::DbConn;
use diesel::PgConnection;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};

/// Wrap any database failure as a seeder error
pub fn io_error<E: Display>(err: E) -> Error {
	Error::raw(ErrorKind::Io, format!("{err}\n"))
}

/// Generate `count` distinct values, suffixing each with a short random tag
///
/// Values are lowercased so they can be used as email local parts.
pub fn generate_unique_set<F>(count: usize, mut f: F) -> Vec<String>
where
	F: FnMut() -> String,
{
	let mut set = HashSet::with_capacity(count);
	let mut rng = rng();

	while set.len() < count {
		let mut value = f().to_lowercase().replace(' ', ".");
		value.push('.');
		value.extend((0..4).map(|_| {
			char::from(rng.sample(Alphanumeric).to_ascii_lowercase())
		}));
		set.insert(value);
	}

	set.into_iter().collect()
}

/// Insert `items` in chunks of `chunk_size`, returning the number of rows
/// written
pub async fn batch_insert<T, F>(
	conn: &DbConn,
	mut items: Vec<T>,
	chunk_size: usize,
	inserter: F,
) -> Result<usize, Error>
where
	T: Send + 'static,
	F: Fn(&mut PgConnection, &[T]) -> Result<usize, diesel::result::Error>
		+ Send
		+ Copy
		+ 'static,
{
	let size = items.len();
	let mut total = 0;

	while !items.is_empty() {
		let chunk =
			items.drain(..chunk_size.min(items.len())).collect::<Vec<_>>();
		let chunk_len = chunk.len();

		let insert_len = conn
			.interact(move |c| inserter(c, &chunk))
			.await
			.map_err(io_error)?
			.map_err(io_error)?;

		total += insert_len;

		println!("Inserted {total}/{size} rows");

		if insert_len != chunk_len {
			return Err(io_error(format!(
				"inserted {insert_len} rows but expected {chunk_len}"
			)));
		}
	}

	Ok(total)
}
