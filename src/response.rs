//! HTTP response builders.
//!
//! Every body warden sends is JSON except `204 No Content`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue, SET_COOKIE};
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Response body type used throughout warden.
pub type Body = Full<Bytes>;

/// Full response type used throughout warden.
pub type HttpResponse = Response<Body>;

fn build(status: StatusCode, body: Bytes, json: bool) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if json {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    response
}

/// Build a JSON response with the given status code and body.
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> crate::Result<HttpResponse> {
    let json = serde_json::to_vec(body)?;
    Ok(build(status, Bytes::from(json), true))
}

/// Build a 200 OK JSON response.
pub fn ok<T: Serialize>(body: &T) -> crate::Result<HttpResponse> {
    json(StatusCode::OK, body)
}

/// Build a 201 Created JSON response.
pub fn created<T: Serialize>(body: &T) -> crate::Result<HttpResponse> {
    json(StatusCode::CREATED, body)
}

/// Build a 204 No Content response.
pub fn no_content() -> HttpResponse {
    build(StatusCode::NO_CONTENT, Bytes::new(), false)
}

/// Build an `{"error": message}` response.
pub fn error(status: StatusCode, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message });
    build(status, Bytes::from(body.to_string()), true)
}

/// Append a `Set-Cookie` header.
pub fn set_cookie(response: &mut HttpResponse, cookie: &str) -> crate::Result<()> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| crate::Error::Internal("Invalid cookie value".to_string()))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}
