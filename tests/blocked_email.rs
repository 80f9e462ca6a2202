use axum::http::StatusCode;
use chrono::{TimeDelta, Weekday};
use serde_json::{Value, json};
use vault::schemas::blocked_email::{
	BlockedStatusResponse,
	UnblockEmailsResponse,
};

mod common;

use common::{BADMINTON_1, MANAGER_EMAIL, STUDENT_EMAILS, TestEnv, next_weekday};

/// Block the given emails for a week starting now
async fn block(env: &mut TestEnv, emails: &[&str]) -> Vec<Value> {
	let now = env.state.config.campus_now();

	env.login(MANAGER_EMAIL).await;

	let response = env
		.app
		.post("/blocked-emails")
		.json(&json!({
			"emails": emails,
			"start": now,
			"end": now + TimeDelta::days(7),
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::CREATED);

	response.json::<Vec<Value>>()
}

#[tokio::test(flavor = "multi_thread")]
async fn block_emails() {
	let mut env = TestEnv::new().await;

	let body = block(&mut env, &[
		STUDENT_EMAILS[0],
		" Student1@IITBBS.ac.in ",
		STUDENT_EMAILS[1],
	])
	.await;

	assert_eq!(body.len(), 2);

	let response = env.app.get("/blocked-emails").await;
	let body = response.json::<Vec<Value>>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(body.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn block_emails_requires_operator() {
	let mut env = TestEnv::new().await;

	let now = env.state.config.campus_now();

	env.login(STUDENT_EMAILS[0]).await;

	let response = env
		.app
		.post("/blocked-emails")
		.json(&json!({
			"emails": [STUDENT_EMAILS[1]],
			"start": now,
			"end": now + TimeDelta::days(1),
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_block_requests() {
	let mut env = TestEnv::new().await;

	let now = env.state.config.campus_now();

	env.login(MANAGER_EMAIL).await;

	let response = env
		.app
		.post("/blocked-emails")
		.json(&json!({
			"emails": [STUDENT_EMAILS[1]],
			"start": now,
			"end": now - TimeDelta::hours(1),
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

	let response = env
		.app
		.post("/blocked-emails")
		.json(&json!({
			"emails": [],
			"start": now,
			"end": now + TimeDelta::hours(1),
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn check_blocked_email() {
	let mut env = TestEnv::new().await;

	block(&mut env, &[STUDENT_EMAILS[0]]).await;

	env.login(STUDENT_EMAILS[2]).await;

	let response = env
		.app
		.get(&format!("/blocked-emails/check?email={}", STUDENT_EMAILS[0]))
		.await;
	let body = response.json::<BlockedStatusResponse>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert!(body.blocked);
	assert!(body.until.is_some());

	let response = env
		.app
		.get(&format!("/blocked-emails/check?email={}", STUDENT_EMAILS[1]))
		.await;
	let body = response.json::<BlockedStatusResponse>();

	assert!(!body.blocked);
	assert!(body.until.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_blocks_are_dropped() {
	let mut env = TestEnv::new().await;

	let now = env.state.config.campus_now();

	env.login(MANAGER_EMAIL).await;

	let response = env
		.app
		.post("/blocked-emails")
		.json(&json!({
			"emails": [STUDENT_EMAILS[0]],
			"start": now - TimeDelta::days(7),
			"end": now - TimeDelta::days(1),
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::CREATED);

	let response = env
		.app
		.get(&format!("/blocked-emails/check?email={}", STUDENT_EMAILS[0]))
		.await;
	let body = response.json::<BlockedStatusResponse>();

	assert!(!body.blocked);

	let response = env.app.get("/blocked-emails").await;
	let body = response.json::<Vec<Value>>();

	assert!(body.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn blocked_profile_cannot_book() {
	let mut env = TestEnv::new().await;

	block(&mut env, &[STUDENT_EMAILS[0]]).await;

	let monday = next_weekday(&env.state.config, Weekday::Mon);
	let request = json!({
		"courtId": BADMINTON_1,
		"date": monday,
		"timeSlot": "06:00:00 - 07:00:00",
		"companions": [STUDENT_EMAILS[1]],
	});

	env.login(STUDENT_EMAILS[0]).await;

	let response = env.app.post("/court-bookings").json(&request).await;
	let body = response.json::<Value>();

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
	assert_eq!(body["code"], 7);

	env.login(MANAGER_EMAIL).await;

	let response = env
		.app
		.post("/blocked-emails/unblock")
		.json(&json!({ "emails": [STUDENT_EMAILS[0], STUDENT_EMAILS[3]] }))
		.await;
	let body = response.json::<UnblockEmailsResponse>();

	assert_eq!(response.status_code(), StatusCode::OK);
	assert_eq!(body.unblocked, vec![STUDENT_EMAILS[0].to_string()]);

	env.login(STUDENT_EMAILS[0]).await;

	let response = env.app.post("/court-bookings").json(&request).await;

	assert_eq!(response.status_code(), StatusCode::CREATED);
}

#[tokio::test(flavor = "multi_thread")]
async fn unblock_removes_one_entry_at_a_time() {
	let mut env = TestEnv::new().await;

	block(&mut env, &[STUDENT_EMAILS[0]]).await;
	block(&mut env, &[STUDENT_EMAILS[0]]).await;

	let unblock = json!({ "emails": [STUDENT_EMAILS[0]] });

	let response = env.app.post("/blocked-emails/unblock").json(&unblock).await;
	assert_eq!(response.status_code(), StatusCode::OK);

	let response = env
		.app
		.get(&format!("/blocked-emails/check?email={}", STUDENT_EMAILS[0]))
		.await;

	assert!(response.json::<BlockedStatusResponse>().blocked);

	env.app.post("/blocked-emails/unblock").json(&unblock).await;

	let response = env
		.app
		.get(&format!("/blocked-emails/check?email={}", STUDENT_EMAILS[0]))
		.await;

	assert!(!response.json::<BlockedStatusResponse>().blocked);
}
