//! JSON and XML request/response entities.
//!
//! The request's `Content-Type` picks the decoder. The response format comes
//! from `Accept`, falling back to the request format when the header is
//! missing or accepts anything.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::response::BoxBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Xml,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Xml => "application/xml",
        }
    }

    /// Parses a single media range, ignoring parameters such as `charset`.
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next()?.trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(MediaType::Json),
            "application/xml" | "text/xml" => Some(MediaType::Xml),
            _ => None,
        }
    }

    /// The format of the request body.
    pub fn from_content_type(headers: &HeaderMap) -> Result<Self> {
        let value = headers
            .get(CONTENT_TYPE)
            .ok_or_else(|| Error::unsupported_media_type("missing content-type"))?
            .to_str()
            .map_err(|_| Error::unsupported_media_type("content-type is not valid ascii"))?;

        Self::parse(value).ok_or_else(|| {
            Error::unsupported_media_type(format!(
                "unsupported content-type '{value}', expected application/json or application/xml"
            ))
        })
    }

    /// Picks the response format from `Accept`.
    ///
    /// Media ranges are tried in order of their `q` weight, ties keeping
    /// header order. Ranges with `q=0` are excluded.
    pub fn negotiate(headers: &HeaderMap, fallback: MediaType) -> Result<Self> {
        let Some(accept) = headers.get(ACCEPT) else {
            return Ok(fallback);
        };
        let accept = accept
            .to_str()
            .map_err(|_| Error::not_acceptable("accept is not valid ascii"))?;

        let mut ranges: Vec<(&str, f32)> = accept
            .split(',')
            .map(str::trim)
            .filter(|range| !range.is_empty())
            .map(|range| (range, quality(range)))
            .filter(|(_, q)| *q > 0.0)
            .collect();
        ranges.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (range, _) in ranges {
            let essence = range.split(';').next().unwrap_or("").trim();
            if essence == "*/*" || essence == "application/*" {
                return Ok(fallback);
            }
            if let Some(media) = Self::parse(range) {
                return Ok(media);
            }
        }

        Err(Error::not_acceptable(format!(
            "cannot produce any of '{accept}', supported: application/json, application/xml"
        )))
    }
}

fn quality(range: &str) -> f32 {
    range
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().strip_prefix("q="))
        .find_map(|q| q.trim().parse::<f32>().ok())
        .unwrap_or(1.0)
}

pub fn decode<T: DeserializeOwned>(media: MediaType, body: &[u8]) -> Result<T> {
    match media {
        MediaType::Json => serde_json::from_slice(body)
            .map_err(|e| Error::bad_request(format!("invalid json body: {e}"))),
        MediaType::Xml => {
            let text = std::str::from_utf8(body)
                .map_err(|_| Error::bad_request("xml body is not valid utf-8"))?;
            quick_xml::de::from_str(text)
                .map_err(|e| Error::bad_request(format!("invalid xml body: {e}")))
        }
    }
}

pub fn encode<T: Serialize>(
    media: MediaType,
    status: StatusCode,
    value: &T,
) -> Result<Response<BoxBody>> {
    let body = match media {
        MediaType::Json => serde_json::to_vec(value)
            .map_err(|e| Error::internal(format!("failed to encode json: {e}")))?,
        MediaType::Xml => quick_xml::se::to_string(value)
            .map_err(|e| Error::internal(format!("failed to encode xml: {e}")))?
            .into_bytes(),
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(media.as_str()));
    Ok(response)
}

/// Reads and decodes a request entity.
///
/// Returns the value together with the request's own media type, which is
/// the default response format.
pub async fn read<T: DeserializeOwned>(req: Request<Incoming>) -> Result<(T, MediaType)> {
    let media = MediaType::from_content_type(req.headers())?;
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| Error::bad_request(format!("failed to read body: {e}")))?
        .to_bytes();
    Ok((decode(media, &body)?, media))
}
