// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use http_body_util::Full;
use hyper::{
    body::Bytes,
    header,
    http::{self, HeaderMap, HeaderValue},
    Response, StatusCode,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

pub type HttpResponse = Response<Full<Bytes>>;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Authorization, Content-Type";

/// Status codes returned in the body of collector responses. The values and
/// their texts are fixed by the HEC protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HecStatus {
    Success,
    InvalidJson,
    InternalError,
}

impl HecStatus {
    pub fn code(self) -> u8 {
        match self {
            HecStatus::Success => 0,
            HecStatus::InvalidJson => 6,
            HecStatus::InternalError => 8,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            HecStatus::Success => "Success",
            HecStatus::InvalidJson => "Invalid JSON",
            HecStatus::InternalError => "Internal error",
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            HecStatus::Success => StatusCode::OK,
            HecStatus::InvalidJson => StatusCode::BAD_REQUEST,
            HecStatus::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Builds the collector response for `status`.
///
/// Response body format:
/// {
///     "text": "Success",
///     "code": 0
/// }
pub fn create_hec_response(status: HecStatus) -> http::Result<HttpResponse> {
    let body = HecResponseBody {
        text: status.text(),
        code: status.code(),
    };
    create_json_response(&body, status.http_status())
}

#[derive(Serialize)]
struct HecResponseBody {
    text: &'static str,
    code: u8,
}

/// Serializes `body` as the JSON payload of a response carrying CORS headers.
pub fn create_json_response<T: Serialize + ?Sized>(
    body: &T,
    status: StatusCode,
) -> http::Result<HttpResponse> {
    // serializing a serde_json::Value or a plain derived struct can't fail
    let body = serde_json::to_vec(body).unwrap_or_default();
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(headers) = builder.headers_mut() {
        add_cors_headers(headers);
    }
    builder.body(Full::new(Bytes::from(body)))
}

/// Does two things:
/// 1. Logs the given message. A success status code (within 200-299) will cause a debug log to be
///    written, otherwise error will be written.
/// 2. Returns the given message in the body of JSON response with the given status code.
///
/// Response body format:
/// {
///     "error": message
/// }
pub fn log_and_create_error_response(
    message: &str,
    status: StatusCode,
) -> http::Result<HttpResponse> {
    if status.is_success() || status == StatusCode::NOT_FOUND {
        debug!("{message}");
    } else {
        error!("{message}");
    }
    create_json_response(&json!({ "error": message }), status)
}

/// CORS preflight answer: empty body, permissive headers.
pub fn create_preflight_response() -> http::Result<HttpResponse> {
    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(headers) = builder.headers_mut() {
        add_cors_headers(headers);
    }
    builder.body(Full::new(Bytes::new()))
}

/// Bare 404 for unknown routes, without CORS headers.
pub fn create_not_found_response() -> http::Result<HttpResponse> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new(Bytes::new()))
}

pub fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Takes a request's header map and returns the declared body length.
///
/// A missing or unparseable "content-length" header counts as an empty body.
pub fn declared_content_length(header_map: &HeaderMap) -> usize {
    let Some(content_length_header) = header_map.get(header::CONTENT_LENGTH) else {
        debug!("Request has no Content-Length header, treating body as empty");
        return 0;
    };
    match content_length_header
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
    {
        Some(content_length) => content_length,
        None => {
            debug!(
                "Invalid Content-Length header {:?}, treating body as empty",
                content_length_header
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use hyper::header;
    use hyper::HeaderMap;
    use hyper::StatusCode;

    use super::*;

    fn create_test_headers_with_content_length(val: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::CONTENT_LENGTH, val.parse().unwrap());
        map
    }

    async fn get_response_body_as_string(response: HttpResponse) -> String {
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.into_iter().collect()).unwrap()
    }

    #[tokio::test]
    async fn test_hec_success_response() {
        let response = create_hec_response(HecStatus::Success).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(
            get_response_body_as_string(response).await,
            "{\"text\":\"Success\",\"code\":0}"
        );
    }

    #[tokio::test]
    async fn test_hec_error_responses() {
        let response = create_hec_response(HecStatus::InvalidJson).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value =
            serde_json::from_str(&get_response_body_as_string(response).await).unwrap();
        assert_eq!(body, json!({"text": "Invalid JSON", "code": 6}));

        let response = create_hec_response(HecStatus::InternalError).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value =
            serde_json::from_str(&get_response_body_as_string(response).await).unwrap();
        assert_eq!(body, json!({"text": "Internal error", "code": 8}));
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response =
            log_and_create_error_response("Index missing not found", StatusCode::NOT_FOUND)
                .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            get_response_body_as_string(response).await,
            "{\"error\":\"Index missing not found\"}"
        );
    }

    #[tokio::test]
    async fn test_preflight_response() {
        let response = create_preflight_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Authorization, Content-Type"
        );
        assert_eq!(get_response_body_as_string(response).await, "");
    }

    #[tokio::test]
    async fn test_not_found_response_has_no_cors() {
        let response = create_not_found_response().unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
        assert_eq!(get_response_body_as_string(response).await, "");
    }

    #[test]
    fn test_content_length_missing() {
        assert_eq!(declared_content_length(&HeaderMap::new()), 0);
    }

    #[test]
    fn test_content_length_cant_convert_to_usize() {
        assert_eq!(
            declared_content_length(&create_test_headers_with_content_length("not_an_int")),
            0
        );
        assert_eq!(
            declared_content_length(&create_test_headers_with_content_length("-5")),
            0
        );
    }

    #[test]
    fn test_content_length_cant_convert_to_str() {
        assert_eq!(
            declared_content_length(&create_test_headers_with_content_length("❤❤❤")),
            0
        );
    }

    #[test]
    fn test_content_length_valid() {
        assert_eq!(
            declared_content_length(&create_test_headers_with_content_length("128")),
            128
        );
    }
}
