use criterion::{Criterion, criterion_group, criterion_main};
use fit_sync_client::{FitnessService, http_client::ReqwestFitnessService};
use tokio::runtime::Builder;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bench_get_fitness_data(c: &mut Criterion) {
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");

    let server = rt.block_on(async {
        let server = MockServer::start().await;
        // a year of daily rows to exercise decoding
        let body: Vec<serde_json::Value> = (0..365)
            .map(|i| serde_json::json!({"name": format!("day {i}"), "steps": 5000 + i, "calories": 210.5}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/google-fit/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    });

    let client = ReqwestFitnessService::new(&server.uri(), None).expect("client");
    c.bench_function("get_fitness_data_365_rows", |b| {
        b.to_async(&rt).iter(|| {
            let client = client.clone();
            async move {
                let rows = client.get_fitness_data().await.expect("data");
                assert_eq!(rows.len(), 365);
            }
        })
    });
}

criterion_group!(benches, bench_get_fitness_data);
criterion_main!(benches);
