use crate::common::EchoMessage;
use crate::{EchoError, Result};
use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use tracing::{trace, warn};

/// Body returned for a `GET` probe
pub const GREETING: &str = "hello, world";

/// Answers one request/response exchange
///
/// `GET` returns [`GREETING`]; `PUT` decodes the body as an [`EchoMessage`]
/// and sends the same message back. Holds no state, so one instance can be
/// shared by every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestEchoResponder;

impl RequestEchoResponder {
    pub fn new() -> Self {
        Self
    }

    /// Produces the reply for `method` with `body`
    ///
    /// Fails with [`EchoError::MalformedPayload`] when a `PUT` body is not an
    /// `EchoMessage`.
    pub fn respond(&self, method: &Method, body: &[u8]) -> Result<Response<Bytes>> {
        match *method {
            Method::GET => Ok(text_response(StatusCode::OK, GREETING.to_string())),
            Method::PUT => {
                let message = EchoMessage::decode(body)?;
                trace!(idx = message.idx, "Echoing message");
                Ok(Response::builder()
                    .status(StatusCode::OK)
                    .header(CONTENT_TYPE, "application/json")
                    .body(Bytes::from(message.encode()?))
                    .map_err(|e| EchoError::Http(e.to_string()))?)
            }
            _ => Ok(Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header(ALLOW, "GET, PUT")
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(Bytes::from(format!("Method {method} not allowed")))
                .map_err(|e| EchoError::Http(e.to_string()))?),
        }
    }

    /// Like [`respond`](Self::respond) but turns a malformed payload into a `400`
    pub fn handle(&self, request: &Request<Bytes>) -> Response<Bytes> {
        match self.respond(request.method(), request.body()) {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %request.method(), error = %e, "Rejecting request");
                text_response(StatusCode::BAD_REQUEST, e.to_string())
            }
        }
    }
}

/// Plain-text response with the given status
pub fn text_response(status: StatusCode, body: String) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_greeting() {
        let response = RequestEchoResponder::new().respond(&Method::GET, b"").unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), GREETING.as_bytes());
    }

    #[test]
    fn test_put_echoes_message() {
        let body = br#"{"body":"hello, world!","idx":12}"#;
        let response = RequestEchoResponder::new().respond(&Method::PUT, body).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), body);
    }

    #[test]
    fn test_put_normalises_to_canonical_encoding() {
        let response = RequestEchoResponder::new()
            .respond(&Method::PUT, br#"{ "idx": 3, "body": "x" }"#)
            .unwrap();
        assert_eq!(
            EchoMessage::decode(response.body()).unwrap(),
            EchoMessage::new("x", 3)
        );
        assert_eq!(response.body().as_ref(), br#"{"body":"x","idx":3}"#);
    }

    #[test]
    fn test_malformed_put_is_an_error_then_a_400() {
        let responder = RequestEchoResponder::new();
        assert!(matches!(
            responder.respond(&Method::PUT, b"{not json"),
            Err(EchoError::MalformedPayload(_))
        ));

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api")
            .body(Bytes::from_static(b"{not json"))
            .unwrap();
        let response = responder.handle(&request);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Still answers normally afterwards
        let response = responder.respond(&Method::GET, b"").unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_other_methods_not_allowed() {
        let response = RequestEchoResponder::new().respond(&Method::POST, b"{}").unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, PUT");
    }
}
