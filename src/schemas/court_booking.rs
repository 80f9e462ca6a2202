use chrono::{NaiveDate, NaiveDateTime};
use common::Error;
use db::CourtBookingStatus;
use models::{CourtBooking, CourtBookingRequest, TimeSlot};
use primitives::ProfileSummary;
use serde::{Deserialize, Serialize};
use validator::Validate;
use validator_derive::Validate;

const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtBookingResponse {
	pub id:             i32,
	pub court_id:       i32,
	pub court_name:     String,
	pub court_type:     String,
	pub start:          NaiveDateTime,
	pub end:            NaiveDateTime,
	/// The booking date as shown in the history views
	pub date:           String,
	/// The booked slot as shown in the history views
	pub time_slot:      String,
	pub status:         CourtBookingStatus,
	pub requester:      ProfileSummary,
	pub companions:     Vec<ProfileSummary>,
	pub punched_in_at:  Option<NaiveDateTime>,
	pub punched_out_at: Option<NaiveDateTime>,
	pub created_at:     NaiveDateTime,
	pub updated_at:     NaiveDateTime,
}

impl From<CourtBooking> for CourtBookingResponse {
	fn from(value: CourtBooking) -> Self {
		let booking = value.primitive;

		let time_slot = TimeSlot {
			start: booking.start_time.time(),
			end:   booking.end_time.time(),
		};

		Self {
			id:             booking.id,
			court_id:       booking.court_id,
			court_name:     booking.court_name,
			court_type:     booking.court_type,
			start:          booking.start_time,
			end:            booking.end_time,
			date:           booking
				.start_time
				.date()
				.format(DATE_DISPLAY_FORMAT)
				.to_string(),
			time_slot:      time_slot.to_string(),
			status:         booking.status,
			requester:      value.requester,
			companions:     value.companions,
			punched_in_at:  booking.punched_in_at,
			punched_out_at: booking.punched_out_at,
			created_at:     booking.created_at,
			updated_at:     booking.updated_at,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourtBookingRequest {
	pub court_id:   i32,
	pub date:       NaiveDate,
	#[validate(length(min = 1, message = "a time slot is required"))]
	pub time_slot:  String,
	#[serde(default)]
	pub companions: Vec<String>,
}

impl CreateCourtBookingRequest {
	pub fn to_insertable(self) -> Result<CourtBookingRequest, Error> {
		self.validate()?;

		Ok(CourtBookingRequest {
			court_id:   self.court_id,
			date:       self.date,
			time_slot:  self.time_slot,
			companions: self.companions,
		})
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPermissionQuery {
	pub court_id: i32,
	pub date:     NaiveDate,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPermissionResponse {
	/// Whether the profile may request another booking of this court type
	pub allowed: bool,
}

#[cfg(test)]
mod tests {
	use chrono::NaiveTime;
	use primitives::PrimitiveCourtBooking;

	use super::*;

	fn summary(id: i32) -> ProfileSummary {
		ProfileSummary {
			id,
			first_name: "Test".to_string(),
			last_name: "Profile".to_string(),
			email: format!("user{id}@iitbbs.ac.in"),
		}
	}

	#[test]
	fn response_carries_display_strings() {
		let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
		let at = |h| date.and_time(NaiveTime::from_hms_opt(h, 0, 0).unwrap());

		let booking = CourtBooking {
			primitive:  PrimitiveCourtBooking {
				id:             1,
				court_id:       2,
				court_name:     "Badminton 1".to_string(),
				start_time:     at(6),
				end_time:       at(7),
				status:         CourtBookingStatus::Reserved,
				requested_user: 1,
				court_type:     "badminton".to_string(),
				punched_in_at:  None,
				punched_out_at: None,
				created_at:     at(5),
				updated_at:     at(5),
			},
			requester:  summary(1),
			companions: vec![summary(2)],
		};

		let response = CourtBookingResponse::from(booking);

		assert_eq!(response.date, "2025-03-03");
		assert_eq!(response.time_slot, "06:00:00 - 07:00:00");
		assert_eq!(response.companions.len(), 1);
	}

	#[test]
	fn missing_companions_default_to_none() {
		let req: CreateCourtBookingRequest = serde_json::from_value(
			serde_json::json!({
				"courtId": 1,
				"date": "2025-03-03",
				"timeSlot": "06:00:00 - 07:00:00",
			}),
		)
		.unwrap();

		assert!(req.companions.is_empty());
		assert!(req.to_insertable().is_ok());
	}
}
