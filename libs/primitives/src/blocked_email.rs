use chrono::NaiveDateTime;
use db::blocked_email;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = blocked_email)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveBlockedEmail {
	pub id:         i32,
	pub email:      String,
	#[serde(rename = "start")]
	pub start_time: NaiveDateTime,
	#[serde(rename = "end")]
	pub end_time:   NaiveDateTime,
	pub created_at: NaiveDateTime,
	pub created_by: Option<i32>,
}

impl PrimitiveBlockedEmail {
	/// Whether the block window has ended at the given time
	#[must_use]
	pub fn is_expired(&self, now: NaiveDateTime) -> bool { self.end_time < now }
}
