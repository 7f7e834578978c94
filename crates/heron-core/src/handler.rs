//! Handler functions and body codecs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use heron_router::MimeType;

use crate::args::Args;
use crate::fault::Fault;
use crate::flowing::FlowingRequest;
use crate::message::Response;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler receives for one request.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The flowing request after every input stage
    pub request: FlowingRequest,
    /// Arguments resolved by the handler's parameter binding
    pub args: Args,
    /// The fault, for server-error handlers whose declaration matches it
    pub fault: Option<Fault>,
}

impl Invocation {
    /// The negotiated response content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&MimeType> {
        self.request.content_type()
    }
}

/// A type-erased asynchronous handler.
pub type HandlerFn =
    Arc<dyn Fn(Invocation) -> BoxFuture<'static, Result<Response, Fault>> + Send + Sync>;

/// Wraps an async function as a [`HandlerFn`].
///
/// # Example
///
/// ```
/// use heron_core::{handler_fn, Invocation, Response, Fault};
///
/// let handler = handler_fn(|inv: Invocation| async move {
///     let id = inv.args.str(0).unwrap_or("none").to_string();
///     Ok::<_, Fault>(Response::ok().with_body(id))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Fault>> + Send + 'static,
{
    Arc::new(
        move |invocation: Invocation| -> BoxFuture<'static, Result<Response, Fault>> {
            Box::pin(f(invocation))
        },
    )
}

/// Decodes request bodies and encodes response bodies for routes that
/// override the default codec.
pub trait BodyCodec: Send + Sync + 'static {
    /// Returns the codec name for logging.
    fn name(&self) -> &'static str;

    /// Transforms a request body before the handler sees it.
    fn decode(&self, body: Bytes) -> Result<Bytes, Fault>;

    /// Transforms a response body produced for `content_type`.
    fn encode(&self, body: Bytes, content_type: Option<&MimeType>) -> Result<Bytes, Fault>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Request;

    struct Upper;

    impl BodyCodec for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn decode(&self, body: Bytes) -> Result<Bytes, Fault> {
            Ok(Bytes::from(body.to_ascii_uppercase()))
        }

        fn encode(&self, body: Bytes, _content_type: Option<&MimeType>) -> Result<Bytes, Fault> {
            Ok(body)
        }
    }

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|inv: Invocation| async move {
            Ok(Response::ok().with_body(format!("{}", inv.args.len())))
        });
        let invocation = Invocation {
            request: FlowingRequest::from(Request::get("/")),
            args: Args::new(),
            fault: None,
        };
        let response = handler(invocation).await.unwrap();
        assert_eq!(response.body().map(|b| &b[..]), Some(&b"0"[..]));
    }

    #[tokio::test]
    async fn test_handler_fault() {
        let handler = handler_fn(|_inv: Invocation| async move { Err(Fault::msg("nope")) });
        let invocation = Invocation {
            request: FlowingRequest::from(Request::get("/")),
            args: Args::new(),
            fault: None,
        };
        assert_eq!(handler(invocation).await.unwrap_err().to_string(), "nope");
    }

    #[test]
    fn test_codec_object_safe() {
        let codec: Arc<dyn BodyCodec> = Arc::new(Upper);
        assert_eq!(codec.name(), "upper");
        assert_eq!(&codec.decode(Bytes::from_static(b"ab")).unwrap()[..], b"AB");
    }
}
