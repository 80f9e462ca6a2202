use chrono::NaiveDateTime;
use db::{ProfileRole, profile};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = profile)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveProfile {
	pub id:            i32,
	pub first_name:    String,
	pub last_name:     String,
	pub email:         String,
	pub role:          ProfileRole,
	pub original_role: Option<ProfileRole>,
	pub society_id:    Option<i32>,
	pub image_url:     Option<String>,
	pub created_at:    NaiveDateTime,
	pub last_login_at: NaiveDateTime,
}

/// The public identity of a profile, as shown next to bookings
#[derive(Clone, Debug, Deserialize, Queryable, Selectable, Serialize)]
#[diesel(table_name = profile)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
	pub id:         i32,
	pub first_name: String,
	pub last_name:  String,
	pub email:      String,
}
