//! HTTP/1.1 framing for `tokio_util::codec::Framed`
//!
//! Only `Content-Length` bodies are supported, which is all the echo
//! exchange needs. One codec per side: [`HttpServerCodec`] reads requests
//! and writes responses, [`HttpClientCodec`] does the opposite.

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, Method, Request, Response, StatusCode, Version};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

const MAX_HEADERS: usize = 32;
const MAX_HEAD_SIZE: usize = 16 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HttpCodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(String),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    #[error("Body of {size} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { size: usize, limit: usize },
}

impl HttpCodecError {
    /// Status the server answers with before dropping a connection that sent this
    pub fn status(&self) -> StatusCode {
        match self {
            HttpCodecError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Whether the connection may carry another exchange after this message
pub fn keep_alive(version: Version, headers: &HeaderMap) -> bool {
    let connection = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .collect::<Vec<_>>();

    if connection.iter().any(|t| t == "close") {
        return false;
    }
    version == Version::HTTP_11 || connection.iter().any(|t| t == "keep-alive")
}

fn parsed_version(minor: Option<u8>) -> Version {
    match minor {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    }
}

fn body_length(headers: &[httparse::Header<'_>], limit: usize) -> Result<Option<usize>, HttpCodecError> {
    if headers
        .iter()
        .any(|h| h.name.eq_ignore_ascii_case(TRANSFER_ENCODING.as_str()))
    {
        return Err(HttpCodecError::InvalidMessage(
            "Transfer-Encoding bodies are not supported".to_string(),
        ));
    }

    let Some(header) = headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()))
    else {
        return Ok(None);
    };

    let size = std::str::from_utf8(header.value)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .ok_or_else(|| HttpCodecError::InvalidMessage("invalid Content-Length".to_string()))?;
    if size > limit {
        return Err(HttpCodecError::BodyTooLarge { size, limit });
    }
    Ok(Some(size))
}

fn copy_headers(src: &[httparse::Header<'_>], dst: &mut HeaderMap) -> Result<(), HttpCodecError> {
    for header in src {
        let name = http::header::HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|e| HttpCodecError::InvalidMessage(e.to_string()))?;
        let value = http::HeaderValue::from_bytes(header.value)
            .map_err(|e| HttpCodecError::InvalidMessage(e.to_string()))?;
        dst.append(name, value);
    }
    Ok(())
}

fn write_headers(headers: &HeaderMap, body_len: usize, with_length: bool, dst: &mut BytesMut) {
    for (name, value) in headers {
        if *name == CONTENT_LENGTH {
            continue;
        }
        dst.put_slice(name.as_str().as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\r\n");
    }
    if with_length {
        dst.put_slice(format!("content-length: {body_len}\r\n").as_bytes());
    }
    dst.put_slice(b"\r\n");
}

fn check_head_size(src: &BytesMut) -> Result<(), HttpCodecError> {
    if src.len() > MAX_HEAD_SIZE {
        return Err(HttpCodecError::HttpParse(format!(
            "header section larger than {MAX_HEAD_SIZE} bytes"
        )));
    }
    Ok(())
}

/// Server side: decodes requests, encodes responses
#[derive(Debug, Clone)]
pub struct HttpServerCodec {
    max_body_size: usize,
}

impl HttpServerCodec {
    pub fn new(max_body_size: usize) -> Self {
        Self { max_body_size }
    }
}

impl Decoder for HttpServerCodec {
    type Item = Request<Bytes>;
    type Error = HttpCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut parsed = httparse::Request::new(&mut headers);

        let head_len = match parsed.parse(src) {
            Ok(httparse::Status::Complete(n)) => n,
            Ok(httparse::Status::Partial) => {
                check_head_size(src)?;
                return Ok(None);
            }
            Err(e) => return Err(HttpCodecError::HttpParse(format!("Failed to parse request head: {e}"))),
        };

        let body_len = body_length(parsed.headers, self.max_body_size)?.unwrap_or(0);
        if src.len() < head_len + body_len {
            src.reserve(head_len + body_len - src.len());
            return Ok(None);
        }

        let method = parsed
            .method
            .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
            .ok_or_else(|| HttpCodecError::InvalidMessage("invalid method".to_string()))?;
        let uri = parsed
            .path
            .unwrap_or("/")
            .parse::<http::Uri>()
            .map_err(|e| HttpCodecError::InvalidMessage(e.to_string()))?;
        let version = parsed_version(parsed.version);
        let mut header_map = HeaderMap::new();
        copy_headers(parsed.headers, &mut header_map)?;

        let _ = src.split_to(head_len);
        let body = src.split_to(body_len).freeze();

        let mut request = Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.version_mut() = version;
        *request.headers_mut() = header_map;
        Ok(Some(request))
    }
}

impl Encoder<Response<Bytes>> for HttpServerCodec {
    type Error = HttpCodecError;

    fn encode(&mut self, item: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let status = item.status();
        let body = item.body();
        dst.reserve(128 + body.len());

        dst.put_slice(
            format!(
                "HTTP/1.1 {} {}\r\n",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );
        // A 101 hands the connection over; it never carries a length
        let with_length = status != StatusCode::SWITCHING_PROTOCOLS;
        write_headers(item.headers(), body.len(), with_length, dst);
        dst.put_slice(body);
        Ok(())
    }
}

/// Client side: encodes requests, decodes responses
#[derive(Debug, Clone)]
pub struct HttpClientCodec {
    max_body_size: usize,
}

impl HttpClientCodec {
    pub fn new(max_body_size: usize) -> Self {
        Self { max_body_size }
    }
}

impl Encoder<Request<Bytes>> for HttpClientCodec {
    type Error = HttpCodecError;

    fn encode(&mut self, item: Request<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let path = item
            .uri()
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        let body = item.body();
        dst.reserve(128 + body.len());

        dst.put_slice(format!("{} {} HTTP/1.1\r\n", item.method(), path).as_bytes());
        let with_length = !body.is_empty() || item.method() == Method::PUT || item.method() == Method::POST;
        write_headers(item.headers(), body.len(), with_length, dst);
        dst.put_slice(body);
        Ok(())
    }
}

impl Decoder for HttpClientCodec {
    type Item = Response<Bytes>;
    type Error = HttpCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut parsed = httparse::Response::new(&mut headers);

        let head_len = match parsed.parse(src) {
            Ok(httparse::Status::Complete(n)) => n,
            Ok(httparse::Status::Partial) => {
                check_head_size(src)?;
                return Ok(None);
            }
            Err(e) => return Err(HttpCodecError::HttpParse(format!("Failed to parse response head: {e}"))),
        };

        let status = parsed
            .code
            .and_then(|c| StatusCode::from_u16(c).ok())
            .ok_or_else(|| HttpCodecError::InvalidMessage("invalid status code".to_string()))?;
        let body_len = match body_length(parsed.headers, self.max_body_size)? {
            Some(n) => n,
            None if status.is_informational()
                || status == StatusCode::NO_CONTENT
                || status == StatusCode::NOT_MODIFIED =>
            {
                0
            }
            None => {
                return Err(HttpCodecError::InvalidMessage(
                    "responses without Content-Length are not supported".to_string(),
                ));
            }
        };
        if src.len() < head_len + body_len {
            src.reserve(head_len + body_len - src.len());
            return Ok(None);
        }

        let version = parsed_version(parsed.version);
        let mut header_map = HeaderMap::new();
        copy_headers(parsed.headers, &mut header_map)?;

        let _ = src.split_to(head_len);
        let body = src.split_to(body_len).freeze();

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.version_mut() = version;
        *response.headers_mut() = header_map;
        Ok(Some(response))
    }
}
