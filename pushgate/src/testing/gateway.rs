use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One request as the gateway saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPush {
    pub method: Method,
    pub path: String,
    pub content_type: String,
    pub body: String,
}

struct GatewayState {
    status: StatusCode,
    received: Vec<ReceivedPush>,
    /// Grouping key path -> metric name -> text block for that family.
    groups: HashMap<String, BTreeMap<String, String>>,
}

/// A Pushgateway stand-in listening on a random local port.
///
/// `POST` merges families into the group at the request path, `PUT`
/// replaces the group and `DELETE` removes it. Requests are stored even
/// when the gateway is configured to answer with an error status, but the
/// groups only change on success.
pub struct MockGateway {
    addr: SocketAddr,
    state: Arc<Mutex<GatewayState>>,
    _shutdown: oneshot::Sender<()>,
}

impl MockGateway {
    pub async fn start() -> Self {
        Self::with_status(StatusCode::OK).await
    }

    /// Starts a gateway that answers every request with `status`.
    pub async fn with_status(status: StatusCode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(GatewayState {
            status,
            received: Vec::new(),
            groups: HashMap::new(),
        }));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let shared = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { break };
                        let state = shared.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req: Request<Incoming>| {
                                let state = state.clone();
                                async move { Ok::<_, Infallible>(record(&state, req).await) }
                            });
                            let _ = http1::Builder::new()
                                .serve_connection(TokioIo::new(stream), service)
                                .await;
                        });
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self {
            addr,
            state,
            _shutdown: shutdown_tx,
        }
    }

    /// `host:port`, as it would appear in `PUSHGATEWAYHOST`.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn received(&self) -> Vec<ReceivedPush> {
        self.state.lock().unwrap().received.clone()
    }

    /// Names of the families stored under `path`, sorted.
    pub fn metric_names(&self, path: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(path)
            .map(|group| group.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Stored value of an unlabelled gauge.
    pub fn value(&self, path: &str, metric: &str) -> Option<f64> {
        let state = self.state.lock().unwrap();
        let block = state.groups.get(path)?.get(metric)?;
        block
            .lines()
            .filter(|line| !line.starts_with('#'))
            .find_map(|line| {
                let (name, value) = line.rsplit_once(' ')?;
                (name == metric).then(|| value.parse().ok()).flatten()
            })
    }
}

async fn record(state: &Mutex<GatewayState>, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let content_type = req
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = match req.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).to_string(),
        Err(_) => String::new(),
    };

    let mut state = state.lock().unwrap();
    let status = state.status;

    if status.is_success() {
        let families = split_families(&body);
        if method == Method::PUT {
            state.groups.insert(path.clone(), families);
        } else if method == Method::POST {
            state.groups.entry(path.clone()).or_default().extend(families);
        } else if method == Method::DELETE {
            state.groups.remove(&path);
        }
    }

    state.received.push(ReceivedPush {
        method,
        path,
        content_type,
        body,
    });

    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Splits a text exposition body into one block per family, keyed by name.
fn split_families(body: &str) -> BTreeMap<String, String> {
    let mut families = BTreeMap::new();
    let mut current: Option<(String, String)> = None;

    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("# HELP ") {
            if let Some((name, block)) = current.take() {
                families.insert(name, block);
            }
            let name = rest.split_whitespace().next().unwrap_or_default().to_string();
            current = Some((name, String::new()));
        }
        if let Some((_, block)) = current.as_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }
    if let Some((name, block)) = current {
        families.insert(name, block);
    }

    families
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "\
# HELP a_seconds first
# TYPE a_seconds gauge
a_seconds 1.5
# HELP b_total second
# TYPE b_total gauge
b_total 42
";

    #[test]
    fn test_split_families() {
        let families = split_families(BODY);
        assert_eq!(families.len(), 2);
        assert!(families["a_seconds"].contains("a_seconds 1.5"));
        assert!(families["b_total"].starts_with("# HELP b_total"));
    }

    #[test]
    fn test_split_families_empty() {
        assert!(split_families("").is_empty());
    }
}
