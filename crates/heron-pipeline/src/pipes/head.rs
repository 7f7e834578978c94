//! `HEAD` body removal.

use heron_core::{Fault, FlowingResponse};
use http::Method;

use crate::pipe::OutputPipe;

/// Drops the body of responses to `HEAD` requests, keeping status and
/// headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropHeadBody;

impl OutputPipe for DropHeadBody {
    fn name(&self) -> &str {
        "drop_head_body"
    }

    fn pipe_out(&self, response: FlowingResponse) -> Result<FlowingResponse, Fault> {
        if response.request().method() == Method::HEAD && response.body().is_some() {
            Ok(response.with_body(None))
        } else {
            Ok(response)
        }
    }
}
