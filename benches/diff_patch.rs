use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use textdelta::Engine;
use textdelta::protocol::delta::to_delta;
use textdelta::protocol::patch_text::patch_to_text;

fn generate_json_data(size: usize, variation: f32) -> (String, String) {
    let base = match size {
        100 => r#"{"id":"123","name":"Alice Johnson","email":"alice@example.com","status":"active"}"#.to_string(),
        1000 => {
            r#"{"id":"123","name":"Alice Johnson","email":"alice@example.com","phone":"+1234567890","address":{"street":"123 Main St","city":"Springfield","state":"IL","zip":"62701"},"preferences":{"newsletter":true,"notifications":"email","theme":"dark"},"metadata":{"created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-15T12:30:00Z","last_login":"2024-03-01T09:15:00Z","login_count":42,"tags":["premium","verified","beta_tester"],"subscription":{"plan":"pro","expires":"2024-12-31T23:59:59Z","auto_renew":true}},"status":"active"}"#.to_string()
        }
        _ => {
            // Pretty-printed so line mode has lines to work with.
            let mut json = String::from("{\n  \"id\": \"123\",\n  \"logs\": [\n");
            for i in 0..size / 80 {
                json.push_str(&format!(
                    "    {{\"timestamp\": \"2024-03-01T09:{:02}:00Z\", \"message\": \"User action {}\"}},\n",
                    i % 60,
                    i
                ));
            }
            json.push_str("  ],\n  \"name\": \"Alice Johnson\",\n  \"status\": \"active\"\n}\n");
            json
        }
    };

    let modified = match variation {
        v if v < 0.1 => base.replace("Alice Johnson", "Alicia Johnson"),
        v if v < 0.3 => base
            .replace("Alice Johnson", "Alicia J. Smith")
            .replace("active", "inactive")
            .replace("User action 1", "User action 01"),
        _ => format!(
            "{},\"new_field\":\"This is additional data that wasn't present before\"}}",
            base.trim_end().trim_end_matches('}')
        ),
    };

    (base, modified)
}

fn generate_log_data(lines: usize, new_lines: usize) -> (String, String) {
    let mut base = String::new();
    for i in 0..lines {
        base.push_str(&format!(
            "[2024-03-01T09:00:{:02}Z] INFO: Application event {} occurred\n",
            i % 60,
            i
        ));
    }

    let mut modified = base.clone();
    for i in lines..(lines + new_lines) {
        modified.push_str(&format!(
            "[2024-03-01T09:01:{:02}Z] INFO: Application event {} occurred\n",
            i % 60,
            i
        ));
    }

    (base, modified)
}

fn benchmark_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");
    group.measurement_time(Duration::from_secs(1));
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));

    let engine = Engine::default();

    for size in [1000, 10000] {
        for variation in [0.05, 0.2] {
            let (original, modified) = generate_json_data(size, variation);
            let change_percent = (variation * 100.0) as u32;
            group.throughput(Throughput::Bytes(modified.len() as u64));

            for line_mode in [false, true] {
                let mode = if line_mode { "lines" } else { "chars" };
                group.bench_with_input(
                    BenchmarkId::new(
                        format!("json_{mode}"),
                        format!("{size}B_{change_percent}%change"),
                    ),
                    &(&original, &modified),
                    |b, (orig, modif)| {
                        b.iter(|| {
                            engine
                                .diff_main_with(black_box(orig), black_box(modif), line_mode)
                                .len()
                        });
                    },
                );
            }
        }
    }

    for (initial_lines, new_lines) in [(100, 10), (1000, 50)] {
        let (original, modified) = generate_log_data(initial_lines, new_lines);
        group.throughput(Throughput::Bytes(modified.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("log", format!("{initial_lines}lines_+{new_lines}new")),
            &(&original, &modified),
            |b, (orig, modif)| {
                b.iter(|| engine.diff_main(black_box(orig), black_box(modif)).len());
            },
        );
    }

    group.finish();
}

fn benchmark_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");
    group.measurement_time(Duration::from_secs(1));
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));

    let engine = Engine::default();
    let (original, modified) = generate_json_data(10000, 0.2);
    let patches = engine.patch_make_from_texts(&original, &modified);

    group.throughput(Throughput::Bytes(original.len() as u64));
    group.bench_function("make", |b| {
        b.iter(|| engine.patch_make_from_texts(black_box(&original), black_box(&modified)))
    });
    group.bench_function("apply_exact", |b| {
        b.iter(|| engine.patch_apply(black_box(&patches), black_box(&original)))
    });

    // Shift everything so each patch has to be found fuzzily.
    let drifted = format!("{{\"preamble\": true}}\n{original}");
    group.bench_function("apply_drifted", |b| {
        b.iter(|| engine.patch_apply(black_box(&patches), black_box(&drifted)))
    });

    group.finish();
}

fn benchmark_encoded_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoded_size");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(1));
    group.warm_up_time(Duration::from_millis(500));

    let engine = Engine::default();

    let scenarios = vec![
        ("minimal_change", generate_json_data(1000, 0.02)),
        ("small_update", generate_json_data(1000, 0.1)),
        ("moderate_change", generate_json_data(1000, 0.3)),
        ("append_only", generate_log_data(500, 20)),
        ("large_payload_small_change", generate_json_data(10000, 0.05)),
    ];

    for (name, (original, modified)) in scenarios {
        let full_size = modified.len();
        let diffs = engine.diff_main(&original, &modified);
        let delta_size = to_delta(&diffs).len();
        let patch_size = patch_to_text(&engine.patch_make(&original, &diffs)).len();

        group.bench_function(format!("{name}/full_{full_size}B"), |b| {
            b.iter(|| full_size)
        });
        group.bench_function(format!("{name}/delta_{delta_size}B"), |b| {
            b.iter(|| to_delta(black_box(&diffs)).len())
        });
        group.bench_function(format!("{name}/patch_{patch_size}B"), |b| {
            b.iter(|| patch_size)
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_diff, benchmark_patch, benchmark_encoded_size);
criterion_main!(benches);
