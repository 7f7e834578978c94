//! Routing benchmarks.
//!
//! Run with: `cargo bench -p heron-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use heron_router::{
    parse_accept, MimeType, Produces, RequestParts, Route, RoutePredicate, RouteTable,
    DEFAULT_ACCEPT_LIMIT,
};
use http::Method;

fn get(path: &str) -> RoutePredicate {
    RoutePredicate::builder()
        .method(Method::GET)
        .path_str(path)
        .expect("valid pattern")
        .build()
        .expect("valid predicate")
}

fn build_table(num_routes: usize) -> RouteTable<usize> {
    let table = RouteTable::new();
    let mut id = 0;

    // Literal routes
    for i in 0..num_routes / 3 {
        table
            .register(Route::new(get(&format!("/api/v1/resource{i}")), id))
            .expect("table not frozen");
        id += 1;
    }

    // Captured routes
    for i in 0..num_routes / 3 {
        table
            .register(Route::new(get(&format!("/api/v1/resource{i}/{{*}}")), id))
            .expect("table not frozen");
        id += 1;
    }

    // Regex routes
    for i in 0..num_routes / 3 {
        table
            .register(Route::new(
                get(&format!("/api/v1/org/{{*}}/resource{i}/{{re:\\d+}}")),
                id,
            ))
            .expect("table not frozen");
        id += 1;
    }

    table
}

fn bench_literal_match(c: &mut Criterion) {
    let table = build_table(100);
    let req = RequestParts::new(Method::GET, "/api/v1/resource20");

    c.bench_function("literal_match", |b| {
        b.iter(|| black_box(table.lookup(&req).map(|m| *m.target)));
    });
}

fn bench_capture_match(c: &mut Criterion) {
    let table = build_table(100);
    let req = RequestParts::new(Method::GET, "/api/v1/resource25/12345");

    c.bench_function("capture_match", |b| {
        b.iter(|| black_box(table.lookup(&req).map(|m| *m.target)));
    });
}

fn bench_regex_match(c: &mut Criterion) {
    let table = build_table(100);
    let req = RequestParts::new(Method::GET, "/api/v1/org/acme-corp/resource10/12345");

    c.bench_function("regex_match", |b| {
        b.iter(|| black_box(table.lookup(&req).map(|m| *m.target)));
    });
}

fn bench_miss(c: &mut Criterion) {
    let table = build_table(100);
    let req = RequestParts::new(Method::GET, "/api/v1/nonexistent/path");

    c.bench_function("miss", |b| {
        b.iter(|| black_box(table.lookup(&req).is_none()));
    });
}

fn bench_negotiation(c: &mut Criterion) {
    let produces = Produces::new([MimeType::html(), MimeType::json(), MimeType::text_plain()]);
    let header = "text/html;q=0.5,application/json;q=0.9,*/*;q=0.1";

    c.bench_function("negotiate", |b| {
        b.iter(|| black_box(produces.negotiate(Some(header), DEFAULT_ACCEPT_LIMIT)));
    });

    c.bench_function("parse_accept", |b| {
        b.iter(|| black_box(parse_accept(header, DEFAULT_ACCEPT_LIMIT)));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [10, 50, 100, 500] {
        let table = build_table(num_routes);

        group.bench_with_input(
            BenchmarkId::new("literal_match", num_routes),
            &num_routes,
            |b, &n| {
                let req = RequestParts::new(Method::GET, &format!("/api/v1/resource{}", n / 6));
                b.iter(|| black_box(table.lookup(&req).map(|m| *m.target)));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("capture_match", num_routes),
            &num_routes,
            |b, &n| {
                let req =
                    RequestParts::new(Method::GET, &format!("/api/v1/resource{}/12345", n / 6));
                b.iter(|| black_box(table.lookup(&req).map(|m| *m.target)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_literal_match,
    bench_capture_match,
    bench_regex_match,
    bench_miss,
    bench_negotiation,
    bench_scaling
);
criterion_main!(benches);
