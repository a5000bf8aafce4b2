//! 分块规划器集成测试

mod common;

use common::sample_rows;
use paper_etl::loader::{effective_chunk_size, plan_chunks};

#[test]
fn test_partition_property_varied_sizes() {
    // 对多组 (行数, 块大小) 验证：拼接所有块恰好还原输入
    let cases = [
        (1usize, 1usize),
        (7, 2),
        (10, 3),
        (100, 100),
        (100, 101),
        (999, 250),
        (5000, 1024),
    ];

    for &(n, size) in &cases {
        let rows = sample_rows(0, n);
        let expected: Vec<String> =
            rows.iter().map(|r| r.paper_id.clone()).collect();

        let chunks = plan_chunks(rows, size);

        // 无丢失、无重复、顺序保持
        let flattened: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.rows.iter().map(|r| r.paper_id.clone()))
            .collect();
        assert_eq!(flattened, expected, "n={}, size={}", n, size);

        // 除最后一块外都是满块
        for chunk in chunks.iter().take(chunks.len().saturating_sub(1)) {
            assert!(!chunk.rows.is_empty());
        }
    }
}

#[test]
fn test_ten_records_chunk_three() {
    let chunks = plan_chunks(sample_rows(0, 10), 3);
    let sizes: Vec<usize> = chunks.iter().map(|c| c.rows.len()).collect();
    assert_eq!(sizes, vec![3, 3, 3, 1]);

    let total_rows: usize = sizes.iter().sum();
    assert_eq!(total_rows, 10);
}

#[test]
fn test_chunk_count_bounded_for_large_sets() {
    // 请求块大小 10、数据量 12 万 -> 自动调优后块数不超过 20
    let chunks = plan_chunks(sample_rows(0, 120_000), 10);
    assert!(chunks.len() <= 20, "实际块数: {}", chunks.len());
    assert!(chunks.len() >= 4);
    // 调优后的块不低于下限
    assert!(chunks.iter().all(|c| c.rows.len() >= 1000));
}

#[test]
fn test_requested_size_respected_when_reasonable() {
    // 正常参数不触发调优
    assert_eq!(effective_chunk_size(50_000, 5000), 5000);
    assert_eq!(effective_chunk_size(8_000, 10), 10);

    let chunks = plan_chunks(sample_rows(0, 50_000), 5000);
    assert_eq!(chunks.len(), 10);
}

#[test]
fn test_empty_and_single_chunk_cases() {
    assert!(plan_chunks(Vec::new(), 100).is_empty());

    let chunks = plan_chunks(sample_rows(0, 42), 1000);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].rows.len(), 42);
    assert_eq!(chunks[0].label(), "1/1");
}
