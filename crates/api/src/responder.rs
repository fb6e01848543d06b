//! Conversion of pipeline results into HTTP responses.
//!
//! Successful results and errors both go through the [`Responder`] trait. Every body is JSON;
//! `204 No Content` has no body at all.

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use serde_json::{Value, json};

use crate::error::ApiError;

const GENERIC_SERVER_ERROR: &str = "Internal Server Error";

/// A type that can be turned into a complete response.
pub trait Responder {
    fn into_response(self) -> Response<Bytes>;
}

/// A successful handler result with the route's success status.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    body: Value,
}

impl Reply {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

impl Responder for Reply {
    fn into_response(self) -> Response<Bytes> {
        if self.status == StatusCode::NO_CONTENT {
            let mut response = Response::new(Bytes::new());
            *response.status_mut() = StatusCode::NO_CONTENT;
            return response;
        }
        json_response(self.status, &self.body)
    }
}

/// Client errors carry their detail; server errors only a generic message.
impl Responder for ApiError {
    fn into_response(self) -> Response<Bytes> {
        let body = match &self {
            ApiError::Validation(errors) => json!({ "detail": errors.to_json() }),
            ApiError::BadRequest { detail }
            | ApiError::Unauthorized { detail }
            | ApiError::Forbidden { detail }
            | ApiError::NotFound { detail } => json!({ "detail": detail }),
            ApiError::ResponseMismatch { .. } | ApiError::Internal { .. } => json!({ "detail": GENERIC_SERVER_ERROR }),
        };
        json_response(self.status(), &body)
    }
}

impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn into_response(self) -> Response<Bytes> {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl Responder for Response<Bytes> {
    fn into_response(self) -> Response<Bytes> {
        self
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<Bytes> {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => Bytes::from(bytes),
        Err(_) => return plain_server_error(),
    };
    let length = bytes.len();
    let mut response = Response::new(bytes);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}

fn plain_server_error() -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(GENERIC_SERVER_ERROR.as_bytes()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldError, Location, ValidationError};

    fn body(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn reply_is_json_with_its_status() {
        let response = Reply::new(StatusCode::CREATED, json!({ "id": 1 })).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body(&response), json!({ "id": 1 }));
    }

    #[test]
    fn no_content_has_an_empty_body() {
        let response = Reply::new(StatusCode::NO_CONTENT, Value::Null).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn validation_errors_list_every_field() {
        let mut errors = ValidationError::new();
        errors.push(FieldError::missing(Location::Query, "q"));
        let response = ApiError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body(&response),
            json!({ "detail": [{ "loc": ["query", "q"], "msg": "field required", "type": "missing" }] })
        );
    }

    #[test]
    fn client_errors_carry_their_detail() {
        let response = ApiError::not_found("User not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response), json!({ "detail": "User not found" }));
    }

    #[test]
    fn server_errors_hide_their_detail() {
        let response = ApiError::response_mismatch("UserOutput", "missing field `email`").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), json!({ "detail": "Internal Server Error" }));
    }
}
