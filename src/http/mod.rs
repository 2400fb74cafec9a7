//! HTTP request/response echo
//!
//! This module provides the HTTP/1.1 framing used on both sides, the
//! responder behind `GET /api` and `PUT /api`, and the keep-alive client
//! the request benchmark drives.

pub mod client;
pub mod codec;
pub mod responder;

pub use client::HttpEchoClient;
pub use codec::{HttpClientCodec, HttpCodecError, HttpServerCodec};
pub use responder::{GREETING, RequestEchoResponder};
