//! Body codec override.

use std::fmt;
use std::sync::Arc;

use heron_core::{BodyCodec, Fault, FlowingRequest, FlowingResponse};

use crate::pipe::{InputOutcome, InputPipe, OutputPipe};

/// Decodes the request body with a route's codec.
#[derive(Clone)]
pub struct CodecDecode {
    codec: Arc<dyn BodyCodec>,
}

impl CodecDecode {
    /// Creates the pipe.
    #[must_use]
    pub fn new(codec: Arc<dyn BodyCodec>) -> Self {
        Self { codec }
    }
}

impl fmt::Debug for CodecDecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CodecDecode").field(&self.codec.name()).finish()
    }
}

impl InputPipe for CodecDecode {
    fn name(&self) -> &str {
        "codec_decode"
    }

    fn pipe_in(&self, request: FlowingRequest) -> Result<InputOutcome, Fault> {
        let Some(body) = request.body().cloned() else {
            return Ok(InputOutcome::Continue(request));
        };
        let decoded = self.codec.decode(body)?;
        Ok(InputOutcome::Continue(request.with_body(Some(decoded))))
    }
}

/// Encodes the response body with a route's codec.
#[derive(Clone)]
pub struct CodecEncode {
    codec: Arc<dyn BodyCodec>,
}

impl CodecEncode {
    /// Creates the pipe.
    #[must_use]
    pub fn new(codec: Arc<dyn BodyCodec>) -> Self {
        Self { codec }
    }
}

impl fmt::Debug for CodecEncode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CodecEncode").field(&self.codec.name()).finish()
    }
}

impl OutputPipe for CodecEncode {
    fn name(&self) -> &str {
        "codec_encode"
    }

    fn pipe_out(&self, response: FlowingResponse) -> Result<FlowingResponse, Fault> {
        let Some(body) = response.body().cloned() else {
            return Ok(response);
        };
        let encoded = self.codec.encode(body, response.request().content_type())?;
        Ok(response.with_body(Some(encoded)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use heron_core::{Request, Response};
    use heron_router::MimeType;

    struct Reverse;

    impl BodyCodec for Reverse {
        fn name(&self) -> &'static str {
            "reverse"
        }

        fn decode(&self, body: Bytes) -> Result<Bytes, Fault> {
            Ok(body.iter().rev().copied().collect::<Vec<u8>>().into())
        }

        fn encode(&self, body: Bytes, content_type: Option<&MimeType>) -> Result<Bytes, Fault> {
            if content_type.is_some() {
                return Err(Fault::msg("typed bodies unsupported"));
            }
            self.decode(body)
        }
    }

    #[test]
    fn test_decode() {
        let pipe = CodecDecode::new(Arc::new(Reverse));
        let request = FlowingRequest::from(Request::post("/").with_body("abc"));
        let InputOutcome::Continue(request) = pipe.pipe_in(request).unwrap() else {
            panic!("expected continue");
        };
        assert_eq!(request.body().map(|b| &b[..]), Some(&b"cba"[..]));
    }

    #[test]
    fn test_decode_without_body() {
        let pipe = CodecDecode::new(Arc::new(Reverse));
        let outcome = pipe.pipe_in(FlowingRequest::from(Request::get("/"))).unwrap();
        assert!(matches!(outcome, InputOutcome::Continue(r) if r.body().is_none()));
    }

    #[test]
    fn test_encode_fault_propagates() {
        let pipe = CodecEncode::new(Arc::new(Reverse));
        let request = FlowingRequest::from(Request::get("/"))
            .with(&heron_core::keys::CONTENT_TYPE, MimeType::json());
        let response = FlowingResponse::new(Response::ok().with_body("x"), request);
        assert!(pipe.pipe_out(response).is_err());
    }
}
