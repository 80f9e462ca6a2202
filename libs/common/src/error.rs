//! Library-wide error types and [`From`] impls

use std::collections::HashMap;
use std::sync::LazyLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDateTime;
use diesel::result::DatabaseErrorKind;
use thiserror::Error;

/// Top level application error, can be converted into a [`Response`]
#[derive(Debug, Error)]
pub enum Error {
	/// Duplicate resource created
	#[error("{0}")]
	Duplicate(String),
	/// Request/operation forbidden
	#[error("forbidden")]
	Forbidden,
	/// An error that should never happen
	#[error("{0}")]
	Infallible(String),
	/// Opaque internal server error
	#[error("internal server error")]
	InternalServerError,
	/// Resource not found
	#[error("not found - {0}")]
	NotFound(String),
	/// Any error related to signing in
	#[error(transparent)]
	LoginError(#[from] LoginError),
	/// Some data in the request was missing
	#[error("{0}")]
	MissingRequestData(String),
	/// Any error related to OAuth login
	#[error(transparent)]
	OAuthError(#[from] OAuthError),
	/// Invalid pagination options
	#[error(transparent)]
	PaginationError(#[from] PaginationError),
	/// Invalid or missing token
	#[error(transparent)]
	TokenError(#[from] TokenError),
	/// Any error related to creating or updating a court booking
	#[error(transparent)]
	CourtBookingError(#[from] CourtBookingError),
	/// Resource could not be validated
	#[error("{0}")]
	ValidationError(String),
}

impl Error {
	/// Return a unique identifying code for this error
	///
	/// When modifying this function the error code should only ever increase,
	/// an error code should never be reused once its assigned to avoid
	/// unexpectedly breaking the frontend
	#[must_use]
	pub fn code(&self) -> i32 {
		match self {
			Self::Duplicate(_) => 1,
			Self::Forbidden => 2,
			Self::Infallible(_) => 3,
			Self::InternalServerError => 4,
			Self::NotFound(_) => 5,
			Self::LoginError(e) => {
				match e {
					LoginError::DomainNotAllowed(_) => 6,
					LoginError::Blocked(_) => 7,
				}
			},
			Self::OAuthError(e) => {
				match e {
					OAuthError::InvalidCSRFToken => 8,
					OAuthError::MissingCSRFTokenCookie => 9,
					OAuthError::MissingEmailField => 10,
					OAuthError::MissingNonceCookie => 11,
					OAuthError::UnknownProvider(_) => 12,
				}
			},
			Self::TokenError(e) => {
				match e {
					TokenError::MissingAccessToken => 13,
					TokenError::MissingSession => 14,
				}
			},
			Self::CourtBookingError(e) => {
				match e {
					CourtBookingError::InvalidTimeSlot(_) => 15,
					CourtBookingError::SlotUnavailable(_) => 16,
					CourtBookingError::SelfCompanion => 17,
					CourtBookingError::DuplicateCompanion => 18,
					CourtBookingError::UnknownCompanion(_) => 19,
					CourtBookingError::NotEnoughCompanions { .. } => 20,
					CourtBookingError::OngoingReservation => 21,
					CourtBookingError::InvalidTransition { .. } => 22,
				}
			},
			Self::PaginationError(e) => {
				match e {
					PaginationError::OffsetTooLarge => 23,
				}
			},
			Self::ValidationError(_) => 24,
			Self::MissingRequestData(_) => 25,
		}
	}

	/// Return additional information about the error
	fn info(&self) -> Option<String> {
		match self {
			Self::Duplicate(m)
			| Self::NotFound(m)
			| Self::LoginError(LoginError::DomainNotAllowed(m))
			| Self::ValidationError(m) => Some(m.to_owned()),
			Self::LoginError(LoginError::Blocked(until)) => {
				Some(serde_json::json!({ "until": until }).to_string())
			},
			Self::CourtBookingError(e) => {
				match e {
					CourtBookingError::InvalidTimeSlot(slot)
					| CourtBookingError::SlotUnavailable(slot) => {
						Some(serde_json::json!({ "slot": slot }).to_string())
					},
					CourtBookingError::UnknownCompanion(email) => {
						Some(serde_json::json!({ "email": email }).to_string())
					},
					CourtBookingError::NotEnoughCompanions {
						required,
						given,
					} => {
						Some(
							serde_json::json!({
								"required": required,
								"given": given,
							})
							.to_string(),
						)
					},
					CourtBookingError::InvalidTransition { from, event } => {
						Some(
							serde_json::json!({ "from": from, "event": event })
								.to_string(),
						)
					},
					_ => None,
				}
			},
			_ => None,
		}
	}

	/// The HTTP status code this error maps to
	#[must_use]
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Duplicate(_)
			| Self::CourtBookingError(
				CourtBookingError::SlotUnavailable(_)
				| CourtBookingError::OngoingReservation
				| CourtBookingError::InvalidTransition { .. },
			) => StatusCode::CONFLICT,
			Self::InternalServerError | Self::Infallible(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			},
			Self::TokenError(_) => StatusCode::UNAUTHORIZED,
			Self::Forbidden | Self::LoginError(_) | Self::OAuthError(_) => {
				StatusCode::FORBIDDEN
			},
			Self::CourtBookingError(_) | Self::PaginationError(_) => {
				StatusCode::BAD_REQUEST
			},
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::ValidationError(_) | Self::MissingRequestData(_) => {
				StatusCode::UNPROCESSABLE_ENTITY
			},
		}
	}
}

/// Convert an error into a [`Response`]
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		debug!("{self:?}");

		let data = serde_json::json!({
			"message": self.to_string(),
			"code": self.code(),
			"info": self.info(),
		});

		(self.status_code(), axum::Json(data)).into_response()
	}
}

/// Any error related to signing in
#[derive(Debug, Error)]
pub enum LoginError {
	#[error("email domain of '{0}' is not allowed to sign in")]
	DomainNotAllowed(String),
	#[error("this account has been blocked")]
	Blocked(NaiveDateTime),
}

/// Any error related to OAuth login
#[derive(Debug, Error)]
pub enum OAuthError {
	#[error("invalid CSRF token provided")]
	InvalidCSRFToken,
	#[error("missing CSRF token cookie")]
	MissingCSRFTokenCookie,
	#[error("missing email field in ID token")]
	MissingEmailField,
	#[error("missing nonce cookie")]
	MissingNonceCookie,
	#[error("unknown SSO provider '{0}'")]
	UnknownProvider(String),
}

/// Any error related to a token
#[derive(Debug, Error)]
pub enum TokenError {
	#[error("missing or invalid access token")]
	MissingAccessToken,
	#[error("missing session")]
	MissingSession,
}

/// Any error related to creating or updating a court booking
#[derive(Debug, Error)]
pub enum CourtBookingError {
	/// The requested time slot could not be parsed
	#[error("Invalid time slot format.")]
	InvalidTimeSlot(String),
	/// The requested slot is not offered or already taken
	#[error("this time slot is not available")]
	SlotUnavailable(String),
	#[error("You cannot add your own email as a companion")]
	SelfCompanion,
	#[error("You are trying to add duplicate email addresses")]
	DuplicateCompanion,
	#[error("User with email {0} not found.")]
	UnknownCompanion(String),
	#[error("this court requires {required} companions, got {given}")]
	NotEnoughCompanions { required: usize, given: usize },
	/// The requester or a companion already holds an active booking of the
	/// same court type
	#[error(
		"You or your companions have an ongoing reservation. Please wait \
		 until it is completed."
	)]
	OngoingReservation,
	#[error(
		"invalid status transition: cannot {event} a booking that is {from}"
	)]
	InvalidTransition { from: String, event: String },
}

#[derive(Debug, Error)]
pub enum PaginationError {
	#[error("the offset is too large for the amount of data")]
	OffsetTooLarge,
}

/// A list of possible internal errors
///
/// API end users should never see these details
#[derive(Debug, Error)]
pub enum InternalServerError {
	/// Unknown database constraint violation
	#[error("constraint error -- {0:?}")]
	ConstraintError(String),
	/// Error executing some database operation
	#[error("database error -- {0:?}")]
	DatabaseError(diesel::result::Error),
	/// Error interacting with a database connection
	#[error("database interaction error -- {0:?}")]
	DatabaseInteractionError(deadpool_diesel::InteractError),
	/// Error acquiring database pool connection
	#[error("database pool error -- {0:?}")]
	PoolError(deadpool_diesel::PoolError),
	/// Error executing some redis operation
	#[error("redis error -- {0:?}")]
	RedisError(redis::RedisError),
	/// Error related to `serde_json`
	#[error("serde_json error -- {0:?}")]
	SerdeJsonError(serde_json::Error),
	/// Attempted to extract a session from a request that has not been
	/// authorized
	#[error("attempted to extract session without checking authorization")]
	SessionWithoutAuthError,
	/// Talking to the identity provider failed
	#[error("identity provider error -- {0}")]
	IdentityProviderError(String),
	/// Failed to parse a url
	#[error("could not parse url -- {0:?}")]
	UrlParseError(url::ParseError),
}

// Map internal server errors to application errors
impl From<InternalServerError> for Error {
	fn from(value: InternalServerError) -> Self {
		error!("internal server error -- {value}");

		Self::InternalServerError
	}
}

/// Map validation errors to application errors
impl From<validator::ValidationErrors> for Error {
	fn from(err: validator::ValidationErrors) -> Self {
		let errs = err.field_errors();
		let repr = errs
			.values()
			.map(|v| {
				v.iter()
					.map(ToString::to_string)
					.collect::<Vec<String>>()
					.join("\n")
			})
			.collect::<Vec<String>>()
			.join("\n");

		Self::ValidationError(repr)
	}
}

/// Map database interaction errors to application errors
impl From<deadpool_diesel::InteractError> for Error {
	fn from(value: deadpool_diesel::InteractError) -> Self {
		InternalServerError::DatabaseInteractionError(value).into()
	}
}

/// Map of constraint names to column names.
static CONSTRAINT_TO_COLUMN: LazyLock<HashMap<&str, &str>> =
	LazyLock::new(|| {
		HashMap::from([
			("profile_email_key", "email"),
			("court_name_key", "name"),
		])
	});

/// Map database result errors to application errors.
impl From<diesel::result::Error> for Error {
	fn from(err: diesel::result::Error) -> Self {
		match &err {
			// No rows returned by query that expected at least one
			diesel::result::Error::NotFound => {
				Self::NotFound("no context provided".to_string())
			},
			// Unique constraint violation
			diesel::result::Error::DatabaseError(
				DatabaseErrorKind::UniqueViolation,
				info,
			) => {
				let Some(constraint_name) = info.constraint_name() else {
					return InternalServerError::DatabaseError(err).into();
				};

				match CONSTRAINT_TO_COLUMN.get(constraint_name) {
					Some(field) => {
						Self::Duplicate(format!("{field} is already in use"))
					},
					None => {
						InternalServerError::ConstraintError(
							constraint_name.to_string(),
						)
						.into()
					},
				}
			},
			// Foreign key constraint violation
			diesel::result::Error::DatabaseError(
				DatabaseErrorKind::ForeignKeyViolation,
				info,
			) => Error::ValidationError(info.message().to_string()),
			_ => InternalServerError::DatabaseError(err).into(),
		}
	}
}

impl From<deadpool_diesel::PoolError> for Error {
	fn from(value: deadpool_diesel::PoolError) -> Self {
		InternalServerError::PoolError(value).into()
	}
}

impl From<redis::RedisError> for Error {
	fn from(err: redis::RedisError) -> Self {
		InternalServerError::RedisError(err).into()
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		InternalServerError::SerdeJsonError(err).into()
	}
}

impl From<url::ParseError> for Error {
	fn from(err: url::ParseError) -> Self {
		InternalServerError::UrlParseError(err).into()
	}
}
