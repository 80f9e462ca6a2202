use chrono::NaiveDateTime;
use common::Error;
use models::NewBlockedEmails;
use primitives::PrimitiveBlockedEmail;
use serde::{Deserialize, Serialize};
use validator::Validate;
use validator_derive::Validate;

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockEmailsRequest {
	#[validate(length(min = 1, message = "at least one email is required"))]
	pub emails: Vec<String>,
	pub start:  NaiveDateTime,
	pub end:    NaiveDateTime,
}

impl BlockEmailsRequest {
	pub fn to_insertable(
		self,
		created_by: i32,
	) -> Result<NewBlockedEmails, Error> {
		self.validate()?;

		Ok(NewBlockedEmails {
			emails:     self.emails,
			start_time: self.start,
			end_time:   self.end,
			created_by: Some(created_by),
		})
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnblockEmailsRequest {
	pub emails: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnblockEmailsResponse {
	pub unblocked: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockedCheckQuery {
	pub email: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedStatusResponse {
	pub blocked: bool,
	pub until:   Option<NaiveDateTime>,
}

impl From<Option<PrimitiveBlockedEmail>> for BlockedStatusResponse {
	fn from(value: Option<PrimitiveBlockedEmail>) -> Self {
		Self { blocked: value.is_some(), until: value.map(|e| e.end_time) }
	}
}
