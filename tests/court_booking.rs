use axum::http::StatusCode;
use chrono::{NaiveDate, TimeDelta, Weekday};
use serde_json::{Value, json};
use vault::schemas::court_booking::CourtBookingResponse;
use vault::schemas::pagination::PaginationResponse;

mod common;

use common::{
	BADMINTON_1,
	BADMINTON_2,
	MANAGER_EMAIL,
	SQUASH,
	STUDENT_EMAILS,
	TestEnv,
	next_weekday,
};

const EARLY_SLOT: &str = "06:00:00 - 07:00:00";

fn booking(court_id: i32, date: NaiveDate, companions: &[&str]) -> Value {
	json!({
		"courtId": court_id,
		"date": date,
		"timeSlot": EARLY_SLOT,
		"companions": companions,
	})
}

/// Book the early badminton slot as the first student with the second one
async fn book_badminton(
	env: &mut TestEnv,
	date: NaiveDate,
) -> CourtBookingResponse {
	env.login(STUDENT_EMAILS[0]).await;

	let response = env
		.app
		.post("/court-bookings")
		.json(&booking(BADMINTON_1, date, &[STUDENT_EMAILS[1]]))
		.await;

	assert_eq!(response.status_code(), StatusCode::CREATED);

	response.json::<CourtBookingResponse>()
}

#[tokio::test(flavor = "multi_thread")]
async fn create_booking() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let body = book_badminton(&mut env, monday).await;

	assert_eq!(body.court_id, BADMINTON_1);
	assert_eq!(body.court_name, "Badminton Court 1");
	assert_eq!(body.time_slot, EARLY_SLOT);
	assert_eq!(body.date, monday.format("%Y-%m-%d").to_string());
	assert_eq!(body.requester.email, STUDENT_EMAILS[0]);
	assert_eq!(body.companions.len(), 1);
	assert_eq!(body.companions[0].email, STUDENT_EMAILS[1]);
	assert!(body.punched_in_at.is_none());

	let response = env
		.app
		.get(&format!("/courts/{BADMINTON_1}/slots?date={monday}"))
		.await;
	let slots = response.json::<Value>();

	assert!(
		!slots["slots"]
			.as_array()
			.unwrap()
			.iter()
			.any(|s| s == EARLY_SLOT)
	);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_booking_requires_login() {
	let env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);

	let response = env
		.app
		.post("/court-bookings")
		.json(&booking(BADMINTON_1, monday, &[STUDENT_EMAILS[1]]))
		.await;

	assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn slot_can_only_be_taken_once() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	book_badminton(&mut env, monday).await;

	env.login(STUDENT_EMAILS[2]).await;

	let response = env
		.app
		.post("/court-bookings")
		.json(&booking(BADMINTON_1, monday, &[STUDENT_EMAILS[3]]))
		.await;
	let body = response.json::<Value>();

	assert_eq!(response.status_code(), StatusCode::CONFLICT);
	assert_eq!(body["code"], 16);
}

#[tokio::test(flavor = "multi_thread")]
async fn slot_outside_opening_hours() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);

	env.login(STUDENT_EMAILS[0]).await;

	let response = env
		.app
		.post("/court-bookings")
		.json(&json!({
			"courtId": SQUASH,
			"date": monday,
			"timeSlot": "12:00:00 - 12:30:00",
		}))
		.await;
	let body = response.json::<Value>();

	assert_eq!(response.status_code(), StatusCode::CONFLICT);
	assert_eq!(body["code"], 16);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_slot() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);

	env.login(STUDENT_EMAILS[0]).await;

	let response = env
		.app
		.post("/court-bookings")
		.json(&json!({
			"courtId": SQUASH,
			"date": monday,
			"timeSlot": "sixteen o'clock",
		}))
		.await;
	let body = response.json::<Value>();

	assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], 15);
}

#[tokio::test(flavor = "multi_thread")]
async fn companion_rules() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);

	env.login(STUDENT_EMAILS[0]).await;

	let cases: [(&[&str], i64); 4] = [
		(&[" Student1@IITBBS.ac.in "], 17),
		(&[STUDENT_EMAILS[1], STUDENT_EMAILS[1]], 18),
		(&["nobody@iitbbs.ac.in"], 19),
		(&[], 20),
	];

	for (companions, code) in cases {
		let response = env
			.app
			.post("/court-bookings")
			.json(&booking(BADMINTON_1, monday, companions))
			.await;
		let body = response.json::<Value>();

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(body["code"], code);
	}
}

#[tokio::test(flavor = "multi_thread")]
async fn companion_with_ongoing_reservation() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	book_badminton(&mut env, monday).await;

	env.login(STUDENT_EMAILS[2]).await;

	// Same court type on the same day, even on another court
	let response = env
		.app
		.post("/court-bookings")
		.json(&booking(BADMINTON_2, monday, &[STUDENT_EMAILS[1]]))
		.await;
	let body = response.json::<Value>();

	assert_eq!(response.status_code(), StatusCode::CONFLICT);
	assert_eq!(body["code"], 21);

	// Another day is fine
	let tuesday = next_weekday(&env.state.config, Weekday::Tue);

	let response = env
		.app
		.post("/court-bookings")
		.json(&booking(BADMINTON_2, tuesday, &[STUDENT_EMAILS[1]]))
		.await;

	assert_eq!(response.status_code(), StatusCode::CREATED);
}

#[tokio::test(flavor = "multi_thread")]
async fn single_player_court_needs_no_companions() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);

	env.login(STUDENT_EMAILS[0]).await;

	let response = env
		.app
		.post("/court-bookings")
		.json(&json!({
			"courtId": SQUASH,
			"date": monday,
			"timeSlot": "16:00:00 - 16:30:00",
		}))
		.await;
	let body = response.json::<CourtBookingResponse>();

	assert_eq!(response.status_code(), StatusCode::CREATED);
	assert!(body.companions.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn booking_permission() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	book_badminton(&mut env, monday).await;

	let query = format!(
		"/court-bookings/permission?courtId={BADMINTON_2}&date={monday}"
	);

	env.login(STUDENT_EMAILS[1]).await;

	let response = env.app.get(&query).await;
	let body = response.json::<Value>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(body["allowed"], false);

	env.login(STUDENT_EMAILS[2]).await;

	let response = env.app.get(&query).await;
	let body = response.json::<Value>();

	assert_eq!(body["allowed"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn own_bookings_include_companion_bookings() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let created = book_badminton(&mut env, monday).await;

	for email in [STUDENT_EMAILS[0], STUDENT_EMAILS[1]] {
		env.login(email).await;

		let response = env.app.get("/court-bookings/me").await;
		let body = response.json::<Vec<CourtBookingResponse>>();

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(body.len(), 1);
		assert_eq!(body[0].id, created.id);
	}

	env.login(STUDENT_EMAILS[2]).await;

	let response = env.app.get("/court-bookings/me").await;
	let body = response.json::<Vec<CourtBookingResponse>>();

	assert!(body.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn get_booking_as_outsider() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let created = book_badminton(&mut env, monday).await;

	let path = format!("/court-bookings/{}", created.id);

	env.login(STUDENT_EMAILS[2]).await;

	let response = env.app.get(&path).await;
	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

	env.login(MANAGER_EMAIL).await;

	let response = env.app.get(&path).await;
	assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn booking_stamps_use_campus_time() {
	let mut env = TestEnv::new().await;

	let before = env.state.config.campus_now() - TimeDelta::seconds(1);

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let body = book_badminton(&mut env, monday).await;

	let after = env.state.config.campus_now();

	assert!(body.created_at >= before && body.created_at <= after);
	assert_eq!(body.created_at, body.updated_at);
}

#[tokio::test(flavor = "multi_thread")]
async fn punch_in_and_out() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let created = book_badminton(&mut env, monday).await;

	let punch_in = format!("/court-bookings/{}/punch-in", created.id);
	let punch_out = format!("/court-bookings/{}/punch-out", created.id);

	let response = env.app.post(&punch_in).await;
	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

	env.login(MANAGER_EMAIL).await;

	let response = env.app.post(&punch_out).await;
	let body = response.json::<Value>();

	assert_eq!(response.status_code(), StatusCode::CONFLICT);
	assert_eq!(body["code"], 22);

	let response = env.app.post(&punch_in).await;
	let body = response.json::<CourtBookingResponse>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(serde_json::to_value(body.status).unwrap(), "punched-in");
	assert_eq!(body.punched_in_at, Some(body.updated_at));

	let response = env.app.post(&punch_in).await;
	assert_eq!(response.status_code(), StatusCode::CONFLICT);

	let response = env.app.post(&punch_out).await;
	let body = response.json::<CourtBookingResponse>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(serde_json::to_value(body.status).unwrap(), "punched-out");
	assert_eq!(body.punched_out_at, Some(body.updated_at));

	// A finished booking no longer blocks its participants
	env.login(STUDENT_EMAILS[1]).await;

	let response = env
		.app
		.get(&format!(
			"/court-bookings/permission?courtId={BADMINTON_1}&date={monday}"
		))
		.await;

	assert_eq!(response.json::<Value>()["allowed"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn mark_overdue_bookings_late() {
	let mut env = TestEnv::new().await;

	let past_monday =
		next_weekday(&env.state.config, Weekday::Mon) - TimeDelta::days(14);
	let future_monday = next_weekday(&env.state.config, Weekday::Mon);

	let overdue = book_badminton(&mut env, past_monday).await;

	env.login(STUDENT_EMAILS[2]).await;

	let response = env
		.app
		.post("/court-bookings")
		.json(&booking(BADMINTON_1, future_monday, &[STUDENT_EMAILS[3]]))
		.await;
	let upcoming = response.json::<CourtBookingResponse>();

	env.login(MANAGER_EMAIL).await;

	let response = env.app.post("/court-bookings/mark-late").await;
	let body = response.json::<Vec<Value>>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(body.len(), 1);

	let response = env
		.app
		.get(&format!("/court-bookings/{}", overdue.id))
		.await;
	let body = response.json::<CourtBookingResponse>();

	assert_eq!(serde_json::to_value(body.status).unwrap(), "late");

	let response = env
		.app
		.get(&format!("/court-bookings/{}", upcoming.id))
		.await;
	let body = response.json::<CourtBookingResponse>();

	assert_eq!(serde_json::to_value(body.status).unwrap(), "reserved");

	// Late is terminal
	let response = env
		.app
		.post(&format!("/court-bookings/{}/mark-late", overdue.id))
		.await;

	assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn mark_single_booking_late() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let created = book_badminton(&mut env, monday).await;

	env.login(MANAGER_EMAIL).await;

	let response = env
		.app
		.post(&format!("/court-bookings/{}/mark-late", created.id))
		.await;
	let body = response.json::<CourtBookingResponse>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(serde_json::to_value(body.status).unwrap(), "late");

	let response = env
		.app
		.post(&format!("/court-bookings/{}/punch-in", created.id))
		.await;

	assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn operator_booking_views() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	book_badminton(&mut env, monday).await;

	let response = env.app.get("/court-bookings").await;
	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

	env.login(MANAGER_EMAIL).await;

	let response = env
		.app
		.get("/court-bookings?status=reserved&search=badminton")
		.await;
	let body = response.json::<PaginationResponse<Vec<CourtBookingResponse>>>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(body.total, 1);

	let response = env.app.get("/court-bookings?status=late").await;
	let body = response.json::<PaginationResponse<Vec<CourtBookingResponse>>>();

	assert_eq!(body.total, 0);

	let response = env
		.app
		.get(&format!("/courts/{BADMINTON_1}/bookings?date={monday}"))
		.await;
	let body = response.json::<Vec<Value>>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(body.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_booking_frees_the_slot() {
	let mut env = TestEnv::new().await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let created = book_badminton(&mut env, monday).await;

	env.login(MANAGER_EMAIL).await;

	let response = env
		.app
		.delete(&format!("/court-bookings/{}", created.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

	let response = env
		.app
		.get(&format!("/court-bookings/{}", created.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

	let response = env
		.app
		.get(&format!("/courts/{BADMINTON_1}/slots?date={monday}"))
		.await;
	let slots = response.json::<Value>();

	assert_eq!(slots["slots"][0], EARLY_SLOT);
}
