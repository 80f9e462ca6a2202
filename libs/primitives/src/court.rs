use chrono::NaiveDateTime;
use db::court;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A court row as stored, `time_slots` holds the serialized weekly schedule
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = court)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveCourt {
	pub id:         i32,
	pub name:       String,
	pub image:      Option<String>,
	pub location:   String,
	pub court_type: String,
	pub min_users:  i32,
	pub max_time:   f64,
	pub time_slots: String,
	pub created_at: NaiveDateTime,
	pub updated_at: NaiveDateTime,
}

/// The fields shown in court listings
#[derive(Clone, Debug, Deserialize, Queryable, Selectable, Serialize)]
#[diesel(table_name = court)]
#[diesel(check_for_backend(Pg))]
pub struct CourtSummary {
	pub id:       i32,
	pub name:     String,
	pub image:    Option<String>,
	pub location: String,
}
