//! Negotiated content type injection.

use heron_core::{Fault, FlowingResponse};
use http::header::{HeaderValue, CONTENT_TYPE};

use crate::pipe::OutputPipe;

/// Sets `content-type` to the negotiated type unless the handler set one.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectContentType;

impl OutputPipe for InjectContentType {
    fn name(&self) -> &str {
        "inject_content_type"
    }

    fn pipe_out(&self, response: FlowingResponse) -> Result<FlowingResponse, Fault> {
        let value = response
            .request()
            .content_type()
            .and_then(|mime| HeaderValue::from_str(&mime.to_string()).ok());
        Ok(match value {
            Some(value) => response.with_header_if_absent(CONTENT_TYPE, value),
            None => response,
        })
    }
}
