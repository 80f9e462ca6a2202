use chrono::{NaiveDate, NaiveDateTime};
use common::Error;
use models::{Court, CourtUpdate, NewCourt, TimeSlot, WeeklySchedule};
use serde::{Deserialize, Serialize};
use validator::Validate;
use validator_derive::Validate;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtResponse {
	pub id:         i32,
	pub name:       String,
	pub image:      Option<String>,
	pub location:   String,
	pub court_type: String,
	pub min_users:  i32,
	pub max_time:   f64,
	pub time_slots: WeeklySchedule,
	pub created_at: NaiveDateTime,
	pub updated_at: NaiveDateTime,
}

impl From<Court> for CourtResponse {
	fn from(value: Court) -> Self {
		Self {
			id:         value.primitive.id,
			name:       value.primitive.name,
			image:      value.primitive.image,
			location:   value.primitive.location,
			court_type: value.primitive.court_type,
			min_users:  value.primitive.min_users,
			max_time:   value.primitive.max_time,
			time_slots: value.schedule,
			created_at: value.primitive.created_at,
			updated_at: value.primitive.updated_at,
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourtRequest {
	#[validate(length(
		min = 1,
		max = 64,
		message = "court name must be between 1 and 64 characters long",
		code = "court-name-length"
	))]
	pub name:       String,
	pub image:      Option<String>,
	#[validate(length(min = 1, message = "location is required"))]
	pub location:   String,
	#[validate(length(min = 1, message = "court type is required"))]
	pub court_type: String,
	#[validate(range(min = 1, message = "a court needs at least one user"))]
	pub min_users:  i32,
	#[validate(range(
		exclusive_min = 0.0,
		message = "the booking length must be a positive number of hours"
	))]
	pub max_time:   f64,
	pub time_slots: WeeklySchedule,
}

impl CreateCourtRequest {
	pub fn to_insertable(self) -> Result<NewCourt, Error> {
		self.validate()?;

		Ok(NewCourt {
			name:       self.name.trim().to_string(),
			image:      self.image,
			location:   self.location,
			court_type: self.court_type,
			min_users:  self.min_users,
			max_time:   self.max_time,
			time_slots: self.time_slots.to_text(),
		})
	}
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourtRequest {
	#[validate(length(
		min = 1,
		max = 64,
		message = "court name must be between 1 and 64 characters long",
		code = "court-name-length"
	))]
	pub name:       Option<String>,
	pub image:      Option<String>,
	#[validate(length(min = 1, message = "location is required"))]
	pub location:   Option<String>,
	#[validate(length(min = 1, message = "court type is required"))]
	pub court_type: Option<String>,
	#[validate(range(min = 1, message = "a court needs at least one user"))]
	pub min_users:  Option<i32>,
	#[validate(range(
		exclusive_min = 0.0,
		message = "the booking length must be a positive number of hours"
	))]
	pub max_time:   Option<f64>,
	pub time_slots: Option<WeeklySchedule>,
}

impl UpdateCourtRequest {
	pub fn to_insertable(self) -> Result<CourtUpdate, Error> {
		self.validate()?;

		Ok(CourtUpdate {
			name:       self.name.map(|n| n.trim().to_string()),
			image:      self.image,
			location:   self.location,
			court_type: self.court_type,
			min_users:  self.min_users,
			max_time:   self.max_time,
			time_slots: self.time_slots.map(|s| s.to_text()),
		})
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct CourtSearchQuery {
	pub name: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CourtDateQuery {
	pub date: NaiveDate,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsResponse {
	pub court_id: i32,
	pub date:     NaiveDate,
	pub slots:    Vec<TimeSlot>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request() -> CreateCourtRequest {
		serde_json::from_value(serde_json::json!({
			"name": " Badminton 1 ",
			"image": null,
			"location": "SAC",
			"courtType": "badminton",
			"minUsers": 2,
			"maxTime": 1.0,
			"timeSlots": { "Monday": ["06:00-08:00"] },
		}))
		.unwrap()
	}

	#[test]
	fn create_request_becomes_insertable() {
		let court = request().to_insertable().unwrap();

		assert_eq!(court.name, "Badminton 1");
		assert_eq!(court.time_slots, r#"{"Monday":["06:00-08:00"]}"#);
	}

	#[test]
	fn create_request_rejects_bad_numbers() {
		let mut req = request();
		req.min_users = 0;
		assert!(req.to_insertable().is_err());

		let mut req = request();
		req.max_time = 0.0;
		assert!(req.to_insertable().is_err());
	}

	#[test]
	fn unknown_weekdays_fail_to_parse() {
		let body = serde_json::json!({
			"name": "Squash",
			"location": "SAC",
			"courtType": "squash",
			"minUsers": 2,
			"maxTime": 1.0,
			"timeSlots": { "Someday": ["06:00-08:00"] },
		});

		let req = serde_json::from_value::<CreateCourtRequest>(body);

		assert!(req.is_err());
	}
}
