//! End-to-end dispatch tests.
//!
//! These tests drive a [`Dispatcher`] with whole requests and check the
//! response, covering:
//!
//! 1. Path patterns, captures and typed argument binding
//! 2. Content negotiation and content-type injection
//! 3. Candidate fall-through and the not-found pipeline
//! 4. Fault recovery and the double-fault response
//! 5. Tag merging across controllers and meta tags

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use heron_core::{
    handler_fn, BodyCodec, ConfigError, Converter, Fault, HandlerFn, Invocation, PanicFault,
    ParamBinding, Request, Response,
};
use heron_pipeline::pipe::output_fn;
use heron_pipeline::{
    Assembly, Capability, CapabilityRegistry, Controller, Dispatcher, DispatcherBuilder,
    HandlerSpec, MergeStrategy, Tag, TagValue, DOUBLE_FAULT_BODY, DOUBLE_FAULT_HEADER,
};
use heron_router::MimeType;
use http::{Method, StatusCode};

#[derive(Debug, thiserror::Error)]
#[error("quota exceeded")]
struct QuotaExceeded;

/// Handler answering with a fixed body.
fn reply(body: &'static str) -> HandlerFn {
    handler_fn(move |_inv: Invocation| async move { Ok(Response::ok().with_body(body)) })
}

/// Handler echoing its arguments joined by `,`.
fn echo_args() -> HandlerFn {
    handler_fn(|inv: Invocation| async move {
        let joined = (0..inv.args.len())
            .map(|i| match inv.args.get::<i64>(i) {
                Some(n) => format!("#{n}"),
                None => inv.args.str(i).unwrap_or_default().to_string(),
            })
            .collect::<Vec<_>>()
            .join(",");
        Ok(Response::ok().with_body(joined))
    })
}

fn not_found() -> HandlerSpec {
    HandlerSpec::not_found(
        "missing",
        handler_fn(|_inv: Invocation| async move {
            Ok(Response::new(StatusCode::NOT_FOUND).with_body("missing"))
        }),
    )
    .tag(Tag::produces("text/plain"))
    .tag(Tag::produces_anything())
}

/// Server-error handler reporting whether it saw the fault.
fn server_error(name: &'static str) -> HandlerSpec {
    HandlerSpec::server_error(
        name,
        handler_fn(move |inv: Invocation| async move {
            let seen = match &inv.fault {
                Some(fault) if fault.is_panic() => "panic".to_string(),
                Some(fault) => format!("some:{fault}"),
                None => "none".to_string(),
            };
            Ok(Response::new(StatusCode::INTERNAL_SERVER_ERROR).with_body(format!("{name}:{seen}")))
        }),
    )
}

fn builder() -> DispatcherBuilder {
    Dispatcher::builder()
        .register_handler(not_found())
        .register_handler(server_error("fallback"))
}

fn body(response: &Response) -> String {
    response
        .body()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Paths and arguments
// ============================================================================

#[tokio::test]
async fn test_single_segment_capture() {
    let dispatcher = builder()
        .register_handler(HandlerSpec::route("list", echo_args()).tag(Tag::path("/{*}/list")))
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/res1/list")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(&response), "res1");

    let response = dispatcher.route(Request::get("/res1/res2/list")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_end_capture_takes_the_rest() {
    let dispatcher = builder()
        .register_handler(HandlerSpec::route("rest", echo_args()).tag(Tag::path("/ec/{**}")))
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/ec/a/b/c")).await;
    assert_eq!(body(&response), "a/b/c");
}

#[tokio::test]
async fn test_regex_capture_bound_as_integer() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("by_number", echo_args())
                .tag(Tag::path(r"/re/{re:\d+}"))
                .params(ParamBinding::new().capture(Converter::I64)),
        )
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/re/42")).await;
    assert_eq!(body(&response), "#42");

    let response = dispatcher.route(Request::get("/re/NaN")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(&response), "missing");
}

#[tokio::test]
async fn test_conversion_failure_overflows_to_not_found() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("item", echo_args())
                .tag(Tag::path("/items/{*}"))
                .params(ParamBinding::new().capture(Converter::U8)),
        )
        .build()
        .unwrap();

    assert_eq!(body(&dispatcher.route(Request::get("/items/7")).await), "#7");
    let response = dispatcher.route(Request::get("/items/300")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_query_and_header_arguments() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("search", echo_args())
                .tag(Tag::path("/search"))
                .params(
                    ParamBinding::new()
                        .query("q", Converter::Str)
                        .header("x-page", Converter::I32),
                ),
        )
        .build()
        .unwrap();

    let response = dispatcher
        .route(Request::get("/search?q=red%20fox").with_header("x-page", "3"))
        .await;
    assert_eq!(body(&response), "red fox,#3");

    let response = dispatcher.route(Request::get("/search?q=red")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Negotiation and selection
// ============================================================================

#[tokio::test]
async fn test_accept_quality_ranking() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("page", reply("page"))
                .tag(Tag::path("/page"))
                .tag(Tag::produces("text/html"))
                .tag(Tag::produces("application/json")),
        )
        .build()
        .unwrap();

    let response = dispatcher
        .route(
            Request::get("/page").with_header("accept", "text/html;q=0.5,application/json;q=0.9"),
        )
        .await;
    assert_eq!(response.content_type(), Some("application/json"));

    let response = dispatcher.route(Request::get("/page")).await;
    assert_eq!(response.content_type(), Some("text/html"));
}

#[tokio::test]
async fn test_unacceptable_type_falls_to_not_found() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("page", reply("page"))
                .tag(Tag::path("/page"))
                .tag(Tag::produces("application/json")),
        )
        .build()
        .unwrap();

    let response = dispatcher
        .route(Request::get("/page").with_header("accept", "image/png"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_handler_content_type_kept() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route(
                "csv",
                handler_fn(|_inv: Invocation| async move {
                    Ok(Response::ok().with_header(
                        http::header::CONTENT_TYPE,
                        http::HeaderValue::from_static("text/csv"),
                    ))
                }),
            )
            .tag(Tag::path("/export"))
            .tag(Tag::produces("application/json")),
        )
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/export")).await;
    assert_eq!(response.content_type(), Some("text/csv"));
}

#[tokio::test]
async fn test_not_found_passes_through_outputs() {
    let dispatcher = builder().build().unwrap();

    let response = dispatcher.route(Request::get("/nowhere")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.content_type(), Some("text/plain"));
    assert_eq!(body(&response), "missing");
}

#[tokio::test]
async fn test_query_constraint_selects_route() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("fast", reply("fast"))
                .tag(Tag::path("/search"))
                .tag(Tag::query("mode=fast")),
        )
        .register_handler(
            HandlerSpec::route("full", reply("full"))
                .tag(Tag::path("/search"))
                .tag(Tag::query("mode=full")),
        )
        .build()
        .unwrap();

    assert_eq!(body(&dispatcher.route(Request::get("/search?mode=full")).await), "full");
    assert_eq!(body(&dispatcher.route(Request::get("/search?mode=fast")).await), "fast");
    assert_eq!(
        dispatcher.route(Request::get("/search")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_header_constraint_selects_route() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("v2", reply("v2"))
                .tag(Tag::path("/api"))
                .tag(Tag::header("X-Version=2")),
        )
        .register_handler(HandlerSpec::route("v1", reply("v1")).tag(Tag::path("/api")))
        .build()
        .unwrap();

    let response = dispatcher
        .route(Request::get("/api").with_header("x-version", "2"))
        .await;
    assert_eq!(body(&response), "v2");
    assert_eq!(body(&dispatcher.route(Request::get("/api")).await), "v1");
}

#[tokio::test]
async fn test_head_served_by_get_without_body() {
    let dispatcher = builder()
        .register_handler(HandlerSpec::route("page", reply("page body")).tag(Tag::path("/page")))
        .build()
        .unwrap();

    let response = dispatcher.route(Request::head("/page")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().is_none());

    let response = dispatcher.route(Request::post("/page")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_head_not_served_when_disabled() {
    let config = heron_core::RoutingConfig {
        head_as_get: false,
        ..Default::default()
    };
    let dispatcher = builder()
        .config(config)
        .register_handler(HandlerSpec::route("page", reply("page")).tag(Tag::path("/page")))
        .build()
        .unwrap();

    let response = dispatcher.route(Request::head("/page")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Table lifecycle
// ============================================================================

#[tokio::test]
async fn test_lookups_idempotent_and_table_freezes() {
    let dispatcher = builder()
        .register_handler(HandlerSpec::route("a", reply("a")).tag(Tag::path("/a")))
        .build()
        .unwrap();
    assert!(!dispatcher.is_frozen());

    let first = dispatcher.route(Request::get("/a")).await;
    let second = dispatcher.route(Request::get("/a")).await;
    assert_eq!(body(&first), body(&second));
    assert_eq!(first.headers(), second.headers());
    assert!(dispatcher.is_frozen());

    let err = dispatcher
        .register(HandlerSpec::route("b", reply("b")).tag(Tag::path("/b")))
        .unwrap_err();
    assert_eq!(err, ConfigError::Router(heron_router::RouterError::TableFrozen));
}

#[tokio::test]
async fn test_concurrent_routing() {
    let dispatcher = builder()
        .register_handler(HandlerSpec::route("item", echo_args()).tag(Tag::path("/items/{*}")))
        .build()
        .unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let response = dispatcher.route(Request::get(&format!("/items/x{i}"))).await;
                (i, body(&response))
            })
        })
        .collect();

    for task in tasks {
        let (i, body) = task.await.unwrap();
        assert_eq!(body, format!("x{i}"));
    }
}

// ============================================================================
// Overflow
// ============================================================================

/// Counts how often its output pipe runs.
struct Audit {
    outputs: Arc<AtomicUsize>,
}

impl Capability for Audit {
    fn kind(&self) -> &str {
        "audit"
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Replacing
    }

    fn compile(
        &self,
        _values: &[TagValue],
        assembly: &mut Assembly,
    ) -> heron_core::ConfigResult<()> {
        let outputs = Arc::clone(&self.outputs);
        assembly.add_output(output_fn("audit", move |response| {
            outputs.fetch_add(1, Ordering::SeqCst);
            Ok(response)
        }));
        Ok(())
    }
}

#[tokio::test]
async fn test_overflowing_input_skips_handler_and_outputs() {
    let outputs = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CapabilityRegistry::builder()
        .register(Audit {
            outputs: Arc::clone(&outputs),
        })
        .build();

    let handler_calls = Arc::clone(&calls);
    let dispatcher = builder()
        .registry(registry)
        .register_handler(
            HandlerSpec::route(
                "item",
                handler_fn(move |_inv: Invocation| {
                    let calls = Arc::clone(&handler_calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(Response::ok())
                    }
                }),
            )
            .tag(Tag::path("/items/{*}"))
            .tag(Tag::custom("audit", TagValue::Flag(true)))
            .params(ParamBinding::new().capture(Converter::I64)),
        )
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/items/abc")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(outputs.load(Ordering::SeqCst), 0);

    let response = dispatcher.route(Request::get("/items/1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outputs.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Faults
// ============================================================================

#[tokio::test]
async fn test_handler_fault_reaches_error_pipeline_once() {
    let recovered = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&recovered);
    let dispatcher = Dispatcher::builder()
        .register_handler(not_found())
        .register_handler(HandlerSpec::server_error(
            "counting",
            handler_fn(move |_inv: Invocation| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(Response::new(StatusCode::SERVICE_UNAVAILABLE))
                }
            }),
        ))
        .register_handler(
            HandlerSpec::route(
                "broken",
                handler_fn(|_inv: Invocation| async move { Err(Fault::msg("broken")) }),
            )
            .tag(Tag::path("/broken")),
        )
        .register_handler(HandlerSpec::route("shadowed", reply("shadowed")).tag(Tag::path("/broken")))
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/broken")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(recovered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_error_pipeline_fault_gives_fixed_response() {
    let dispatcher = Dispatcher::builder()
        .register_handler(not_found())
        .register_handler(HandlerSpec::server_error(
            "also_broken",
            handler_fn(|_inv: Invocation| async move { Err(Fault::msg("still broken")) }),
        ))
        .register_handler(
            HandlerSpec::route(
                "broken",
                handler_fn(|_inv: Invocation| async move { Err(Fault::msg("broken")) }),
            )
            .tag(Tag::path("/broken")),
        )
        .build()
        .unwrap();

    let first = dispatcher.route(Request::get("/broken")).await;
    let second = dispatcher.route(Request::get("/broken")).await;
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(&first), DOUBLE_FAULT_BODY);
    assert!(first.headers().contains_key(DOUBLE_FAULT_HEADER));
    assert_eq!(first.status(), second.status());
    assert_eq!(first.headers(), second.headers());
    assert_eq!(first.body(), second.body());
}

#[tokio::test]
async fn test_panic_becomes_fault() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route(
                "panics",
                handler_fn(|inv: Invocation| async move {
                    if !inv.request.path().is_empty() {
                        panic!("handler blew up");
                    }
                    Ok(Response::ok())
                }),
            )
            .tag(Tag::path("/panic")),
        )
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/panic")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(&response), "fallback:panic");
}

#[tokio::test]
async fn test_fault_scoping() {
    let dispatcher = Dispatcher::builder()
        .register_handler(not_found())
        .register_handler(server_error("quota").handles::<QuotaExceeded>())
        .register_handler(server_error("fallback"))
        .register_handler(
            HandlerSpec::route(
                "quota",
                handler_fn(|_inv: Invocation| async move { Err(Fault::new(QuotaExceeded)) }),
            )
            .tag(Tag::path("/quota")),
        )
        .register_handler(
            HandlerSpec::route(
                "disk",
                handler_fn(|_inv: Invocation| async move { Err(Fault::msg("disk full")) }),
            )
            .tag(Tag::path("/disk")),
        )
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/quota")).await;
    assert_eq!(body(&response), "quota:some:quota exceeded");

    // the scoped handler is tried first in registration order but does not
    // see a fault it did not declare
    let response = dispatcher.route(Request::get("/disk")).await;
    assert_eq!(body(&response), "quota:none");
}

#[tokio::test]
async fn test_declared_handler_preferred_over_earlier_catch_all() {
    let dispatcher = Dispatcher::builder()
        .register_handler(not_found())
        .register_handler(server_error("fallback"))
        .register_handler(server_error("quota").handles::<QuotaExceeded>())
        .register_handler(
            HandlerSpec::route(
                "quota",
                handler_fn(|_inv: Invocation| async move { Err(Fault::new(QuotaExceeded)) }),
            )
            .tag(Tag::path("/quota")),
        )
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/quota")).await;
    assert_eq!(body(&response), "quota:some:quota exceeded");
}

#[tokio::test]
async fn test_panic_fault_type_can_be_declared() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::server_error(
                "panics_only",
                handler_fn(|_inv: Invocation| async move {
                    Ok(Response::new(StatusCode::BAD_GATEWAY))
                }),
            )
            .handles::<PanicFault>(),
        )
        .register_handler(
            HandlerSpec::route(
                "panics",
                handler_fn(|inv: Invocation| async move {
                    if inv.args.is_empty() {
                        panic!("no args");
                    }
                    Ok(Response::ok())
                }),
            )
            .tag(Tag::path("/panic")),
        )
        .build()
        .unwrap();

    let response = dispatcher.route(Request::get("/panic")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// ============================================================================
// Tags
// ============================================================================

struct Users;

impl Controller for Users {
    fn tags(&self) -> Vec<Tag> {
        vec![
            Tag::produces("application/json"),
            Tag::default_type("text/plain"),
        ]
    }

    fn handlers(&self) -> Vec<HandlerSpec> {
        vec![
            HandlerSpec::route("list", reply("[]"))
                .tag(Tag::path("/users"))
                .tag(Tag::produces("text/html")),
            HandlerSpec::route("create", reply("created"))
                .tag(Tag::path("/users"))
                .tag(Tag::meta("write", [Tag::method(Method::POST), Tag::method(Method::PUT)]))
                .tag(Tag::default_type("application/json")),
        ]
    }
}

#[tokio::test]
async fn test_controller_tags_combine_with_handler_tags() {
    let dispatcher = builder().register(&Users).build().unwrap();

    let response = dispatcher
        .route(Request::get("/users").with_header("accept", "text/html"))
        .await;
    assert_eq!(body(&response), "[]");
    assert_eq!(response.content_type(), Some("text/html"));

    let response = dispatcher
        .route(Request::get("/users").with_header("accept", "application/json"))
        .await;
    assert_eq!(response.content_type(), Some("application/json"));
}

#[tokio::test]
async fn test_meta_tag_methods_and_replacing_default() {
    let dispatcher = builder().register(&Users).build().unwrap();

    let put = Request::new(Method::PUT, "/users");
    assert_eq!(body(&dispatcher.route(put).await), "created");
    let post = Request::post("/users");
    assert_eq!(body(&dispatcher.route(post).await), "created");

    let delete = dispatcher
        .route(Request::new(Method::DELETE, "/users"))
        .await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    assert_eq!(dispatcher.route_count(), 2);
}

#[tokio::test]
async fn test_all_methods_tag() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("any", reply("any"))
                .tag(Tag::path("/any"))
                .tag(Tag::all_methods()),
        )
        .build()
        .unwrap();

    for method in [Method::GET, Method::POST, Method::DELETE, Method::PATCH] {
        let response = dispatcher.route(Request::new(method, "/any")).await;
        assert_eq!(body(&response), "any");
    }
}

#[tokio::test]
async fn test_produces_anything_falls_back_to_first_type() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route("doc", reply("doc"))
                .tag(Tag::path("/doc"))
                .tag(Tag::produces("application/json"))
                .tag(Tag::produces_anything()),
        )
        .build()
        .unwrap();

    let response = dispatcher
        .route(Request::get("/doc").with_header("accept", "image/png"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/json"));
}

/// Uppercases request bodies and brackets response bodies.
struct Shout;

impl BodyCodec for Shout {
    fn name(&self) -> &'static str {
        "shout"
    }

    fn decode(&self, body: Bytes) -> Result<Bytes, Fault> {
        Ok(Bytes::from(body.to_ascii_uppercase()))
    }

    fn encode(&self, body: Bytes, content_type: Option<&MimeType>) -> Result<Bytes, Fault> {
        let kind = content_type.map(ToString::to_string).unwrap_or_default();
        Ok(Bytes::from(format!(
            "[{kind}] {}",
            String::from_utf8_lossy(&body)
        )))
    }
}

#[tokio::test]
async fn test_codec_override() {
    let dispatcher = builder()
        .register_handler(
            HandlerSpec::route(
                "echo",
                handler_fn(|inv: Invocation| async move {
                    let body = inv.request.body().cloned().unwrap_or_default();
                    Ok(Response::ok().with_body(body))
                }),
            )
            .tag(Tag::path("/echo"))
            .tag(Tag::method(Method::POST))
            .tag(Tag::produces("text/plain"))
            .tag(Tag::codec(Arc::new(Shout))),
        )
        .build()
        .unwrap();

    let response = dispatcher
        .route(Request::post("/echo").with_body("hello"))
        .await;
    assert_eq!(body(&response), "[text/plain] HELLO");
}

#[test]
fn test_unknown_tag_kind_fails_build() {
    let err = builder()
        .register_handler(
            HandlerSpec::route("a", reply("a")).tag(Tag::custom("tenant", TagValue::Flag(true))),
        )
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownCapability {
            kind: "tenant".to_string()
        }
    );
}

#[test]
fn test_invalid_pattern_fails_build() {
    let err = builder()
        .register_handler(HandlerSpec::route("a", reply("a")).tag(Tag::path("/x/{**}/{**}")))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Router(heron_router::RouterError::MultipleEndCaptures { .. })
    ));
}
