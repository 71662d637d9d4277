// End-to-end resolution of operation trees through the public engine API

use approx::assert_abs_diff_eq;
use lae_engine::{
    EngineConfig, ErrorKind, FatiguePolicy, InputFormat, LinearAlgebraEngine, Matrix,
    OperationNode, ResultDocument, TreeParser,
};

fn leaf(rows: &[&[f64]]) -> OperationNode {
    OperationNode::leaf(rows.iter().map(|row| row.to_vec()).collect::<Vec<_>>())
}

fn resolve_with(threads: usize, tree: OperationNode) -> Vec<Vec<f64>> {
    let engine = LinearAlgebraEngine::new(threads).unwrap();
    let root = engine.run(tree).unwrap();
    assert!(root.is_leaf());
    root.into_matrix().unwrap().into_rows()
}

fn resolve(tree: OperationNode) -> Vec<Vec<f64>> {
    resolve_with(4, tree)
}

fn assert_matrix_eq(actual: &[Vec<f64>], expected: &[Vec<f64>]) {
    assert_eq!(actual.len(), expected.len(), "row count");
    for (got_row, want_row) in actual.iter().zip(expected) {
        assert_eq!(got_row.len(), want_row.len(), "column count");
        for (got, want) in got_row.iter().zip(want_row) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-9);
        }
    }
}

/// Deterministic pseudo-random matrix
fn generated(rows: usize, columns: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..rows)
        .map(|_| {
            (0..columns)
                .map(|_| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    ((state >> 33) % 21) as f64 - 10.0
                })
                .collect()
        })
        .collect()
}

fn naive_product(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let columns = b.first().map(Vec::len).unwrap_or(0);
    a.iter()
        .map(|row| {
            (0..columns)
                .map(|j| row.iter().zip(b).map(|(x, b_row)| x * b_row[j]).sum())
                .collect()
        })
        .collect()
}

#[test]
fn test_add_scenario() {
    let tree = OperationNode::add(vec![
        leaf(&[&[1.0, 2.0], &[3.0, 4.0]]),
        leaf(&[&[5.0, 6.0], &[7.0, 8.0]]),
    ]);
    assert_eq!(resolve(tree), vec![vec![6.0, 8.0], vec![10.0, 12.0]]);
}

#[test]
fn test_multiply_scenario() {
    let tree = OperationNode::multiply(vec![
        leaf(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]),
        leaf(&[&[7.0, 8.0], &[9.0, 10.0], &[11.0, 12.0]]),
    ]);
    assert_eq!(resolve(tree), vec![vec![58.0, 64.0], vec![139.0, 154.0]]);
}

#[test]
fn test_transpose_scenario() {
    let tree = OperationNode::transpose(leaf(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]));
    assert_eq!(
        resolve(tree),
        vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
    );
}

#[test]
fn test_sum_then_product() {
    // (A + B) * C
    let a = leaf(&[&[1.0, 1.0], &[1.0, 1.0]]);
    let b = leaf(&[&[1.0, 2.0], &[3.0, 4.0]]);
    let c = leaf(&[&[2.0, 0.0], &[1.0, 2.0]]);

    let tree = OperationNode::multiply(vec![OperationNode::add(vec![a, b]), c]);
    assert_eq!(resolve(tree), vec![vec![7.0, 6.0], vec![13.0, 10.0]]);
}

#[test]
fn test_sum_with_transposed_product() {
    // A + (T(B) * C)
    let a = leaf(&[&[1.0, 1.0], &[1.0, 1.0]]);
    let b = leaf(&[&[1.0, 2.0], &[3.0, 4.0]]);
    let c = leaf(&[&[2.0, 0.0], &[1.0, 2.0]]);

    let tree = OperationNode::add(vec![
        a,
        OperationNode::multiply(vec![OperationNode::transpose(b), c]),
    ]);
    assert_eq!(resolve(tree), vec![vec![6.0, 7.0], vec![9.0, 9.0]]);
}

#[test]
fn test_leaf_root_is_idempotent() {
    let tree = leaf(&[&[1.0, 2.0], &[3.0, 4.0]]);
    let engine = LinearAlgebraEngine::new(2).unwrap();
    assert_eq!(engine.run(tree.clone()).unwrap(), tree);
}

#[test]
fn test_double_negate_and_double_transpose_are_identity() {
    let a = generated(5, 3, 7);

    let negated = resolve(OperationNode::negate(OperationNode::leaf(a.clone())));
    let expected: Vec<Vec<f64>> = a
        .iter()
        .map(|row| row.iter().map(|v| -v).collect())
        .collect();
    assert_matrix_eq(&negated, &expected);

    let twice_negated = resolve(OperationNode::negate(OperationNode::negate(
        OperationNode::leaf(a.clone()),
    )));
    assert_matrix_eq(&twice_negated, &a);

    let transposed = resolve(OperationNode::transpose(OperationNode::leaf(a.clone())));
    assert_eq!((transposed.len(), transposed[0].len()), (3, 5));

    let twice_transposed = resolve(OperationNode::transpose(OperationNode::transpose(
        OperationNode::leaf(a.clone()),
    )));
    assert_eq!(twice_transposed, a);
}

#[test]
fn test_variadic_add_matches_nested_add() {
    let (a, b, c) = (generated(4, 4, 1), generated(4, 4, 2), generated(4, 4, 3));

    let flat = resolve(OperationNode::add(vec![
        OperationNode::leaf(a.clone()),
        OperationNode::leaf(b.clone()),
        OperationNode::leaf(c.clone()),
    ]));

    let ab = resolve(OperationNode::add(vec![
        OperationNode::leaf(a),
        OperationNode::leaf(b),
    ]));
    let nested = resolve(OperationNode::add(vec![
        OperationNode::leaf(ab),
        OperationNode::leaf(c),
    ]));

    assert_matrix_eq(&flat, &nested);
}

#[test]
fn test_variadic_multiply_keeps_operand_order() {
    let a = generated(2, 3, 11);
    let b = generated(3, 4, 12);
    let c = generated(4, 2, 13);

    let result = resolve(OperationNode::multiply(vec![
        OperationNode::leaf(a.clone()),
        OperationNode::leaf(b.clone()),
        OperationNode::leaf(c.clone()),
    ]));

    let expected = naive_product(&naive_product(&a, &b), &c);
    assert_matrix_eq(&result, &expected);
}

#[test]
fn test_larger_product_against_naive() {
    let a = generated(17, 9, 21);
    let b = generated(9, 13, 22);

    let result = resolve_with(3, OperationNode::multiply(vec![
        OperationNode::leaf(a.clone()),
        OperationNode::leaf(b.clone()),
    ]));
    assert_matrix_eq(&result, &naive_product(&a, &b));
}

#[test]
fn test_multiply_dimension_mismatch_is_validation_error() {
    let engine = LinearAlgebraEngine::new(2).unwrap();
    let tree = OperationNode::multiply(vec![
        leaf(&[&[1.0, 2.0, 3.0]]),
        leaf(&[&[1.0, 2.0], &[3.0, 4.0]]),
    ]);

    let err = engine.run(tree).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_add_shape_mismatch_is_validation_error() {
    let engine = LinearAlgebraEngine::new(2).unwrap();
    let tree = OperationNode::add(vec![leaf(&[&[1.0, 2.0]]), leaf(&[&[1.0], &[2.0]])]);

    let err = engine.run(tree).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_stuck_tree_is_tree_resolution_error() {
    let engine = LinearAlgebraEngine::new(2).unwrap();
    let tree = OperationNode::negate(OperationNode::add(Vec::new()));

    let err = engine.run(tree).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TreeResolution);
}

#[test]
fn test_unary_arity_violation_is_tree_resolution_error() {
    let engine = LinearAlgebraEngine::new(2).unwrap();
    let tree = OperationNode::operator(
        lae_engine::OperatorKind::Transpose,
        vec![leaf(&[&[1.0]]), leaf(&[&[2.0]])],
    );

    let err = engine.run(tree).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TreeResolution);
}

#[test]
fn test_single_worker_and_heterogeneous_factors_agree() {
    let a = generated(6, 6, 31);
    let b = generated(6, 6, 32);
    let tree = OperationNode::add(vec![
        OperationNode::multiply(vec![OperationNode::leaf(a.clone()), OperationNode::leaf(b)]),
        OperationNode::transpose(OperationNode::leaf(a)),
    ]);

    let single = resolve_with(1, tree.clone());

    let config = EngineConfig::default()
        .with_threads(3)
        .with_fatigue(FatiguePolicy::Explicit(vec![1.0, 2.0, 4.0]));
    let engine = LinearAlgebraEngine::with_config(config).unwrap();
    let spread = engine.run(tree).unwrap().into_matrix().unwrap().into_rows();

    assert_matrix_eq(&spread, &single);

    let report = engine.report();
    assert_eq!(report.workers.len(), 3);
    // 6 multiply rows + 6 transpose rows + 6 add rows
    assert_eq!(report.total_tasks(), 18);
}

#[test]
fn test_report_text_after_run() {
    let engine = LinearAlgebraEngine::new(2).unwrap();
    engine
        .run(OperationNode::negate(leaf(&[&[1.0, 2.0], &[3.0, 4.0]])))
        .unwrap();

    let text = engine.report().to_string();
    assert!(text.contains("Worker 0:"));
    assert!(text.contains("Worker 1:"));
    assert!(text.contains("Fatigue variance"));
}

#[test]
fn test_parse_run_and_write_document() {
    let json = r#"{
        "operator": "+",
        "operands": [
            [[1, 1], [1, 1]],
            {"operator": "*", "operands": [
                {"operator": "T", "operands": [[[1, 2], [3, 4]]]},
                [[2, 0], [1, 2]]
            ]}
        ]
    }"#;
    let tree = TreeParser::parse(json, InputFormat::Json).unwrap();
    assert_eq!(tree.infer_shape().unwrap(), (2, 2));

    let engine = LinearAlgebraEngine::new(3).unwrap();
    let outcome = engine
        .run(tree)
        .map(|root| root.into_matrix().unwrap_or_default());
    let doc = ResultDocument::from_outcome(outcome);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    doc.write_file(&path).unwrap();

    let written: ResultDocument =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written,
        ResultDocument::Result(Matrix::from(vec![vec![6.0, 7.0], vec![9.0, 9.0]]))
    );
}
