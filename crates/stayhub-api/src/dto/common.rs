//! Common DTOs used across the API

use serde::{Deserialize, Serialize};
use stayhub_core::{traits::Pagination, AppError};
use tracing::warn;
use validator::Validate;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Create a success response with data and message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page", deserialize_with = "deserialize_number_from_string")]
    #[validate(range(min = 1))]
    pub page: i64,

    /// Items per page
    #[serde(
        default = "default_per_page",
        alias = "limit",
        deserialize_with = "deserialize_number_from_string"
    )]
    #[validate(range(min = 1, max = 100))]
    pub per_page: i64,
}

/// Deserialize a number from either a string or a number
///
/// Flattened query structs hand every value over as a string.
pub(crate) fn deserialize_number_from_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct I64OrStringVisitor;

    impl<'de> Visitor<'de> for I64OrStringVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<i64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<i64, E>
        where
            E: de::Error,
        {
            i64::try_from(value).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<i64, E>
        where
            E: de::Error,
        {
            value.trim().parse::<i64>().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(I64OrStringVisitor)
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_per_page() -> i64 {
    10
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Validate and convert to the service-level pagination
    pub fn to_pagination(&self) -> Result<Pagination, AppError> {
        self.validate().map_err(|e| {
            warn!("Pagination validation failed: {}", e);
            AppError::Validation(e.to_string())
        })?;
        Ok(Pagination::new(self.page, self.per_page))
    }
}

/// Validate a request body, logging the failure
pub(crate) fn validated<T: Validate>(req: &T, what: &str) -> Result<(), AppError> {
    req.validate().map_err(|e| {
        warn!("{} validation failed: {}", what, e);
        AppError::Validation(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params_bounds() {
        let params = PaginationParams {
            page: 3,
            per_page: 20,
        };
        let p = params.to_pagination().unwrap();
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        for (page, per_page) in [(0, 10), (1, 0), (1, 101)] {
            assert!(matches!(
                PaginationParams { page, per_page }.to_pagination(),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_number_from_string() {
        let params: PaginationParams =
            serde_json::from_value(serde_json::json!({ "page": "2", "limit": 5 })).unwrap();
        assert_eq!(params.page, 2);
        assert_eq!(params.per_page, 5);

        let defaults: PaginationParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(defaults.page, 1);
        assert_eq!(defaults.per_page, 10);
    }

    #[test]
    fn test_api_response() {
        let resp = ApiResponse::success("test");
        assert_eq!(resp.data, "test");
        assert!(resp.message.is_none());

        let resp = ApiResponse::with_message("data", "Booking created");
        assert_eq!(resp.message.as_deref(), Some("Booking created"));
    }
}
