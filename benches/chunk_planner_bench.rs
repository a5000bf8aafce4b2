use chrono::Local;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use paper_etl::loader::plan_chunks;
use paper_etl::paper::PaperRow;
use std::time::Duration;

fn make_rows(n: usize) -> Vec<PaperRow> {
    let now = Local::now().naive_local();
    (0..n)
        .map(|i| PaperRow {
            paper_id: format!("paper_{:08}", i),
            title: Some(format!("标题 {}", i)),
            section: Some("Introduction".to_string()),
            content: Some("正文内容".to_string()),
            created_at: now,
        })
        .collect()
}

fn bench_plan_chunks(c: &mut Criterion) {
    let sizes = [10_000usize, 100_000usize, 500_000usize];

    let mut group = c.benchmark_group("plan_chunks");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    for &n in &sizes {
        // 请求一个过小的块大小，覆盖自动调优路径
        group.bench_with_input(
            BenchmarkId::new("auto_tuned", n),
            &n,
            |b, &size| {
                b.iter_batched(
                    || make_rows(size),
                    |rows| {
                        let chunks = plan_chunks(rows, 10);
                        assert!(!chunks.is_empty());
                    },
                    criterion::BatchSize::PerIteration,
                )
            },
        );

        // 正常块大小路径
        group.bench_with_input(
            BenchmarkId::new("requested", n),
            &n,
            |b, &size| {
                b.iter_batched(
                    || make_rows(size),
                    |rows| {
                        let chunks = plan_chunks(rows, 5000);
                        assert!(!chunks.is_empty());
                    },
                    criterion::BatchSize::PerIteration,
                )
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_plan_chunks);
criterion_main!(benches);
