use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mkd_duck_ai::app::classify_prompt;
use mkd_duck_ai::app::similarity::similarity;
use mkd_duck_ai::domain::TokenRequest;
use mkd_duck_ai::infra::web::format::sanitize_prompt_for_wiki;
use validator::Validate;

fn bench_similarity(c: &mut Criterion) {
    let prompt = "what is the best way to explain a bug to a rubber duck";
    let scenarios: Vec<String> = (0..200)
        .map(|i| format!("scenario {i} about ducks explaining bugs and other things"))
        .collect();

    c.bench_function("similarity_against_200_scenarios", |b| {
        b.iter(|| {
            scenarios
                .iter()
                .map(|s| similarity(black_box(prompt), s))
                .fold(0.0_f64, f64::max)
        })
    });
}

fn bench_classification(c: &mut Criterion) {
    let prompts = [
        "Tell me a joke about programmers",
        "Any good books by Ursula K. Le Guin?",
        "Who was Grace Hopper?",
        "My build keeps failing for no reason",
    ];

    c.bench_function("classify_prompt", |b| {
        b.iter(|| {
            for prompt in &prompts {
                let _ = classify_prompt(black_box(prompt));
            }
        })
    });
}

fn bench_wiki_sanitizing(c: &mut Criterion) {
    c.bench_function("sanitize_prompt_for_wiki", |b| {
        b.iter(|| sanitize_prompt_for_wiki(black_box("What is the Eiffel Tower (Paris)?")))
    });
}

fn bench_token_validation(c: &mut Criterion) {
    let request = TokenRequest {
        client_id: "duck-trainer".to_string(),
        client_secret: "a-reasonably-long-client-secret-value".to_string(),
    };

    c.bench_function("validate_token_request", |b| {
        b.iter(|| {
            let _ = black_box(&request).validate();
        })
    });
}

criterion_group!(
    benches,
    bench_similarity,
    bench_classification,
    bench_wiki_sanitizing,
    bench_token_validation
);
criterion_main!(benches);
