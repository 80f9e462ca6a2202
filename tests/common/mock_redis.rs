use std::sync::{LazyLock, Mutex, MutexGuard};

use common::RedisConn;
use redis::cmd;

/// Redis ships with 16 logical databases, each test locks one of them
const REDIS_DATABASES: usize = 16;

static REDIS_DATABASE_URLS: LazyLock<[Mutex<String>; REDIS_DATABASES]> =
	LazyLock::new(|| {
		let redis_url = std::env::var("REDIS_URL").unwrap();
		let redis_url = redis_url.trim_end_matches('/').to_string();

		std::array::from_fn(|i| Mutex::new(format!("{redis_url}/{i}")))
	});

pub struct RedisUrlProvider;

/// A locked redis database, flushed when dropped
pub struct RedisUrlGuard(MutexGuard<'static, String>);

impl RedisUrlProvider {
	/// Lock the first free redis database
	pub fn acquire() -> RedisUrlGuard {
		let mut i = 0;

		loop {
			match REDIS_DATABASE_URLS[i].try_lock() {
				Ok(lock) => return RedisUrlGuard(lock),
				// A test panicked while holding this database, it is flushed
				// on drop regardless
				Err(std::sync::TryLockError::Poisoned(p)) => {
					return RedisUrlGuard(p.into_inner());
				},
				Err(std::sync::TryLockError::WouldBlock) => {},
			}

			i = (i + 1) % REDIS_DATABASES;
			std::thread::yield_now();
		}
	}
}

impl RedisUrlGuard {
	pub async fn connect(&self) -> RedisConn {
		let client = redis::Client::open(self.0.as_str()).unwrap();

		client.get_multiplexed_async_connection().await.unwrap()
	}
}

impl Drop for RedisUrlGuard {
	fn drop(&mut self) {
		futures::executor::block_on(async {
			let mut conn = self.connect().await;

			let _: () = cmd("FLUSHDB").query_async(&mut conn).await.unwrap();
		});
	}
}
