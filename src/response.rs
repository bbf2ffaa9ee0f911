//! Outgoing HTTP response accumulator.
//!
//! Handlers do not build a `Response` directly; they write status, headers
//! and body through [`Context`](crate::Context), which owns one of these per
//! request. Once the chain finishes, the accumulator converts into the
//! transport's response type in one shot. Because nothing is flushed to the
//! wire mid-chain, outer middleware (recovery in particular) may replace
//! the whole thing after downstream handlers ran.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

/// An outgoing HTTP response.
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

impl Response {
    /// Empty `200 OK`. What a request ends with when no handler writes.
    pub(crate) fn empty() -> Self {
        Self { status: StatusCode::OK, headers: Vec::new(), body: Bytes::new() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn set_body(&mut self, content_type: &str, body: Bytes) {
        self.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        self.headers.push(("content-type".to_owned(), content_type.to_owned()));
        self.body = body;
    }

    /// Converts into hyper's response type. Headers that do not survive the
    /// `http` crate's validation are dropped with a warning rather than
    /// failing the whole response.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}
