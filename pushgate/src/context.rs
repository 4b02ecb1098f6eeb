/// Per-request data handed to every middleware.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: String,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_trace_id(trace_id: String) -> Self {
        Self { trace_id }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
