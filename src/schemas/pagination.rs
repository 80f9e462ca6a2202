use common::{Error, PaginationError};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schemas::BoundedU32Visitor;

const fn page_default() -> u32 { 1 }

const fn per_page_default() -> u32 { 12 }

/// Pagination request parameters.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
	#[serde(default = "page_default", deserialize_with = "ds_page_bounds")]
	pub page:     u32,
	#[serde(
		default = "per_page_default",
		deserialize_with = "ds_per_page_bounds"
	)]
	pub per_page: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse<T> {
	pub page:     u32,
	pub per_page: u32,
	pub total:    i64,
	pub data:     T,
}

impl Default for PaginationOptions {
	fn default() -> Self { Self { page: 1, per_page: 12 } }
}

impl PaginationOptions {
	/// Wrap a page of data with the current parameters
	///
	/// # Errors
	/// Fails if a page past the first one starts beyond the end of the data
	pub fn paginate<T>(
		&self,
		total: i64,
		data: T,
	) -> Result<PaginationResponse<T>, Error> {
		if self.page > 1 && self.offset() >= total {
			return Err(PaginationError::OffsetTooLarge.into());
		}

		Ok(PaginationResponse {
			page: self.page,
			per_page: self.per_page,
			total,
			data,
		})
	}

	/// Calculate the SQL LIMIT value of these parameters
	#[inline]
	#[must_use]
	pub fn limit(&self) -> i64 { self.per_page.into() }

	/// Calculate the SQL OFFSET value of these parameters
	#[inline]
	#[must_use]
	pub fn offset(&self) -> i64 {
		(i64::from(self.page) - 1) * i64::from(self.per_page)
	}
}

/// Deserialization visitor for `page` bounds.
fn ds_page_bounds<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
	d.deserialize_u32(BoundedU32Visitor { start: 1, end: u32::MAX })
}

/// Deserialization visitor for `per_page` bounds.
fn ds_per_page_bounds<'de, D: Deserializer<'de>>(
	d: D,
) -> Result<u32, D::Error> {
	d.deserialize_u32(BoundedU32Visitor { start: 1, end: 50 })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn offsets() {
		let options = PaginationOptions { page: 3, per_page: 10 };

		assert_eq!(options.limit(), 10);
		assert_eq!(options.offset(), 20);
	}

	#[test]
	fn first_page_of_nothing_is_fine() {
		let page = PaginationOptions::default().paginate(0, Vec::<i32>::new());

		assert!(page.is_ok());
	}

	#[test]
	fn pages_past_the_end_are_rejected() {
		let options = PaginationOptions { page: 2, per_page: 12 };

		let err = options.paginate(12, ()).unwrap_err();

		assert_eq!(err.code(), 23);
		assert!(options.paginate(13, ()).is_ok());
	}
}
