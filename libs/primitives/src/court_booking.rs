use chrono::NaiveDateTime;
use db::{CourtBookingStatus, court_booking, court_booking_companion};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = court_booking)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveCourtBooking {
	pub id:             i32,
	pub court_id:       i32,
	pub court_name:     String,
	#[serde(rename = "start")]
	pub start_time:     NaiveDateTime,
	#[serde(rename = "end")]
	pub end_time:       NaiveDateTime,
	pub status:         CourtBookingStatus,
	pub requested_user: i32,
	pub court_type:     String,
	pub punched_in_at:  Option<NaiveDateTime>,
	pub punched_out_at: Option<NaiveDateTime>,
	pub created_at:     NaiveDateTime,
	pub updated_at:     NaiveDateTime,
}

#[derive(
	Associations,
	Clone,
	Copy,
	Debug,
	Deserialize,
	Identifiable,
	Insertable,
	Queryable,
	Selectable,
	Serialize,
)]
#[diesel(table_name = court_booking_companion)]
#[diesel(primary_key(court_booking_id, profile_id))]
#[diesel(belongs_to(PrimitiveCourtBooking, foreign_key = court_booking_id))]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveCourtBookingCompanion {
	pub court_booking_id: i32,
	pub profile_id:       i32,
}
