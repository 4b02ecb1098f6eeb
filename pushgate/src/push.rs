//! Client for the Prometheus Pushgateway HTTP API.
//!
//! A [`Pusher`] targets one grouping key: a job name plus optional extra
//! labels. [`Pusher::add`] merges the pushed families into the group,
//! [`Pusher::push`] replaces the whole group and [`Pusher::delete`] drops it.
//! None of the operations retry.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};
use thiserror::Error;
use tracing::debug;

const JOB_LABEL: &str = "job";

#[derive(Debug, Error)]
pub enum PushError {
    #[error("invalid gateway url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid grouping label {name}='{value}': {reason}")]
    InvalidGrouping {
        name: String,
        value: String,
        reason: &'static str,
    },
    #[error("pushed metric {metric} already carries grouping label '{label}'")]
    LabelConflict { metric: String, label: String },
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),
    #[error("gateway unreachable: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read gateway response: {0}")]
    Body(#[from] hyper::Error),
    #[error("unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: StatusCode,
        url: String,
        body: String,
    },
}

/// Pushes metric families to one grouping key on a gateway.
#[derive(Clone, Debug)]
pub struct Pusher {
    base: String,
    job: String,
    grouping: Vec<(String, String)>,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl Pusher {
    /// Creates a pusher for `job` on the gateway at `url`.
    ///
    /// `url` may omit the scheme (`localhost:9091`), in which case `http://`
    /// is assumed. A trailing slash is ignored.
    pub fn new(url: &str, job: &str) -> Result<Self, PushError> {
        let base = normalize_base(url)?;
        validate_label_value(JOB_LABEL, job)?;

        Ok(Self {
            base,
            job: job.to_string(),
            grouping: Vec::new(),
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    /// Adds a grouping label besides `job`.
    pub fn grouping(mut self, name: &str, value: &str) -> Result<Self, PushError> {
        if name == JOB_LABEL || name.starts_with("__") {
            return Err(PushError::InvalidGrouping {
                name: name.to_string(),
                value: value.to_string(),
                reason: "reserved label name",
            });
        }
        if !is_valid_label_name(name) {
            return Err(PushError::InvalidGrouping {
                name: name.to_string(),
                value: value.to_string(),
                reason: "label name must match [a-zA-Z_][a-zA-Z0-9_]*",
            });
        }
        validate_label_value(name, value)?;
        self.grouping.push((name.to_string(), value.to_string()));
        Ok(self)
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Full URL of the grouping key, e.g. `http://host:9091/metrics/job/db_backup`.
    pub fn url(&self) -> String {
        let mut url = format!(
            "{}/metrics/{}/{}",
            self.base,
            JOB_LABEL,
            urlencoding::encode(&self.job)
        );
        for (name, value) in &self.grouping {
            url.push('/');
            url.push_str(name);
            url.push('/');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Merges `families` into the group. Metrics not listed keep their
    /// stored values.
    pub async fn add(&self, families: &[MetricFamily]) -> Result<(), PushError> {
        self.send(Method::POST, families).await
    }

    /// Replaces every metric in the group with `families`.
    pub async fn push(&self, families: &[MetricFamily]) -> Result<(), PushError> {
        self.send(Method::PUT, families).await
    }

    /// Deletes the whole group from the gateway.
    pub async fn delete(&self) -> Result<(), PushError> {
        self.send(Method::DELETE, &[]).await
    }

    fn check_labels(&self, families: &[MetricFamily]) -> Result<(), PushError> {
        for family in families {
            for metric in family.get_metric() {
                for pair in metric.get_label() {
                    let label = pair.get_name();
                    if label == JOB_LABEL || self.grouping.iter().any(|(name, _)| name == label) {
                        return Err(PushError::LabelConflict {
                            metric: family.get_name().to_string(),
                            label: label.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    async fn send(&self, method: Method, families: &[MetricFamily]) -> Result<(), PushError> {
        self.check_labels(families)?;

        let encoder = TextEncoder::new();
        let mut body = Vec::new();
        if method != Method::DELETE {
            encoder.encode(families, &mut body)?;
        }

        let url = self.url();
        let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| PushError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        debug!(method = %method, url = %url, families = families.len(), "pushing to gateway");

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, encoder.format_type())
            .body(Full::new(Bytes::from(body)))?;

        let response = self.client.request(request).await?;
        let status = response.status();

        // The gateway answers 200, or 202 before v1.0.
        if status == StatusCode::OK || status == StatusCode::ACCEPTED {
            return Ok(());
        }

        let body = response.into_body().collect().await?.to_bytes();
        Err(PushError::UnexpectedStatus {
            status,
            url,
            body: String::from_utf8_lossy(&body).trim().to_string(),
        })
    }
}

fn normalize_base(url: &str) -> Result<String, PushError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(PushError::InvalidUrl {
            url: url.to_string(),
            reason: "empty".to_string(),
        });
    }

    let base = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    if !base.starts_with("http://") {
        return Err(PushError::InvalidUrl {
            url: url.to_string(),
            reason: "only plain http gateways are supported".to_string(),
        });
    }

    base.parse::<Uri>().map_err(|e| PushError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(base)
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_label_value(name: &str, value: &str) -> Result<(), PushError> {
    let reason = if value.is_empty() {
        "value must not be empty"
    } else if value.contains('/') {
        "value must not contain '/'"
    } else {
        return Ok(());
    };

    Err(PushError::InvalidGrouping {
        name: name.to_string(),
        value: value.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Gauge, GaugeVec, Opts, Registry};

    #[test]
    fn test_url_adds_scheme_and_trims_slash() {
        let pusher = Pusher::new("localhost:9091/", "db_backup").unwrap();
        assert_eq!(pusher.url(), "http://localhost:9091/metrics/job/db_backup");
    }

    #[test]
    fn test_url_keeps_explicit_scheme_and_path() {
        let pusher = Pusher::new("http://gateway.internal/prefix", "db_backup").unwrap();
        assert_eq!(
            pusher.url(),
            "http://gateway.internal/prefix/metrics/job/db_backup"
        );
    }

    #[test]
    fn test_url_encodes_job_and_grouping() {
        let pusher = Pusher::new("localhost:9091", "nightly backup")
            .unwrap()
            .grouping("instance", "db-1:5432")
            .unwrap();
        assert_eq!(
            pusher.url(),
            "http://localhost:9091/metrics/job/nightly%20backup/instance/db-1%3A5432"
        );
    }

    #[test]
    fn test_rejects_https() {
        let err = Pusher::new("https://gateway:9091", "db_backup").unwrap_err();
        assert!(matches!(err, PushError::InvalidUrl { .. }));
    }

    #[test]
    fn test_rejects_empty_host() {
        assert!(matches!(
            Pusher::new("  ", "db_backup"),
            Err(PushError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_job_names() {
        assert!(matches!(
            Pusher::new("localhost:9091", ""),
            Err(PushError::InvalidGrouping { .. })
        ));
        assert!(matches!(
            Pusher::new("localhost:9091", "a/b"),
            Err(PushError::InvalidGrouping { .. })
        ));
    }

    #[test]
    fn test_rejects_reserved_grouping_names() {
        let pusher = Pusher::new("localhost:9091", "db_backup").unwrap();
        assert!(pusher.clone().grouping("job", "x").is_err());
        assert!(pusher.clone().grouping("__name__", "x").is_err());
        assert!(pusher.grouping("", "x").is_err());
    }

    #[test]
    fn test_rejects_malformed_grouping_names() {
        let pusher = Pusher::new("localhost:9091", "db_backup").unwrap();
        for name in ["instance/job", "9 bad", "has space", "dash-ed", "ünicode"] {
            let err = pusher.clone().grouping(name, "x").unwrap_err();
            assert!(
                matches!(err, PushError::InvalidGrouping { name: ref n, .. } if n == name),
                "{name} should be rejected"
            );
        }
        assert_eq!(
            pusher.grouping("_shard2", "x").unwrap().url(),
            "http://localhost:9091/metrics/job/db_backup/_shard2/x"
        );
    }

    #[test]
    fn test_check_labels_rejects_job_label() {
        let registry = Registry::new();
        let vec = GaugeVec::new(Opts::new("labelled", "has a job label"), &["job"]).unwrap();
        vec.with_label_values(&["other"]).set(1.0);
        registry.register(Box::new(vec)).unwrap();

        let pusher = Pusher::new("localhost:9091", "db_backup").unwrap();
        let err = pusher.check_labels(&registry.gather()).unwrap_err();
        assert!(matches!(err, PushError::LabelConflict { ref label, .. } if label == "job"));
    }

    #[test]
    fn test_check_labels_rejects_grouping_label() {
        let registry = Registry::new();
        let vec = GaugeVec::new(Opts::new("labelled", "has an instance"), &["instance"]).unwrap();
        vec.with_label_values(&["db-1"]).set(1.0);
        registry.register(Box::new(vec)).unwrap();

        let pusher = Pusher::new("localhost:9091", "db_backup")
            .unwrap()
            .grouping("instance", "db-1")
            .unwrap();
        assert!(pusher.check_labels(&registry.gather()).is_err());
    }

    #[test]
    fn test_check_labels_accepts_plain_gauges() {
        let registry = Registry::new();
        registry
            .register(Box::new(Gauge::new("plain", "no labels").unwrap()))
            .unwrap();

        let pusher = Pusher::new("localhost:9091", "db_backup").unwrap();
        assert!(pusher.check_labels(&registry.gather()).is_ok());
    }
}
