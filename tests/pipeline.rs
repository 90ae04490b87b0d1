//! End-to-end pipeline integration tests.

use datalab::testing::random_rows;
use datalab::{Damage, Dataset, Fix, TargetFn};

#[test]
fn full_damage_repair_scenario() {
    // 100 x 5 random table, Alpha labels, one appended noise feature,
    // 70/30 split, 10% missing cells, mean repair.
    let ds = Dataset::with_seed(42)
        .random(100, 5)
        .make_target(TargetFn::Alpha)
        .unwrap()
        .damage(Damage::NoiseFeatures(1))
        .unwrap()
        .split(0.3)
        .unwrap()
        .damage(Damage::NaCells(0.1))
        .unwrap()
        .fix(Fix::ColumnMean)
        .unwrap();

    let features = ds.features().unwrap();
    assert_eq!(features.num_cols(), 6);
    assert_eq!(features.num_missing(), 0);

    let train_rows = ds.train_features().unwrap().num_rows();
    let test_rows = ds.test_features().unwrap().num_rows();
    assert_eq!(train_rows + test_rows, 100);
    assert_eq!(test_rows, 30);
}

#[test]
fn set_features_reads_back_elementwise() {
    let rows = random_rows(40, 7, 5);
    let ds = Dataset::with_seed(1).set_features(&rows).unwrap();
    let m = ds.features().unwrap();
    for (r, row) in rows.iter().enumerate() {
        assert_eq!(m.row_slice(r), row.as_slice());
    }
}

#[test]
fn na_damage_then_fix_preserves_untouched_cells() {
    let rows = random_rows(30, 4, 9);
    let baseline = Dataset::with_seed(2).set_features(&rows).unwrap();
    let original = baseline.features().unwrap().clone();

    let fixed = baseline
        .damage(Damage::NaCells(0.2))
        .unwrap()
        .fix(Fix::ColumnMean)
        .unwrap();
    let repaired = fixed.features().unwrap();

    assert_eq!(repaired.num_missing(), 0);
    let changed = repaired
        .as_slice()
        .iter()
        .zip(original.as_slice())
        .filter(|(a, b)| a != b)
        .count();
    // Only the floor(30 * 4 * 0.2) damaged cells may differ.
    assert!(changed <= 24);
}

#[test]
fn repeated_damage_compounds() {
    let mut ds = Dataset::with_seed(3).random(20, 10);
    let mut previous = 0usize;
    for _ in 0..3 {
        ds = ds.damage(Damage::NaCells(0.1)).unwrap();
        let missing = ds.features().unwrap().num_missing();
        assert!(missing >= previous);
        previous = missing;
    }
    assert!(previous > 0);
    assert!(previous <= 200);
}

#[test]
fn split_rounds_test_rows() {
    for (rows, fraction, expected_test) in [(10, 0.3, 3), (7, 0.5, 4), (100, 0.25, 25)] {
        let ds = Dataset::with_seed(4)
            .random(rows, 3)
            .make_target(TargetFn::Alpha)
            .unwrap()
            .split(fraction)
            .unwrap();
        assert_eq!(ds.test_features().unwrap().num_rows(), expected_test);
        assert_eq!(
            ds.train_features().unwrap().num_rows() + ds.test_features().unwrap().num_rows(),
            rows
        );
    }
}

#[test]
fn split_partitions_are_disjoint() {
    // First column is a unique row id, so rows can be traced across the split.
    let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i * 3) as f64]).collect();
    let ds = Dataset::with_seed(8)
        .set_features(&rows)
        .unwrap()
        .make_target(TargetFn::Alpha)
        .unwrap()
        .split(0.25)
        .unwrap();

    let train = ds.train_features().unwrap();
    let test = ds.test_features().unwrap();

    let test_ids: Vec<f64> = test.rows().map(|r| r[0]).collect();
    assert!(train.rows().all(|r| !test_ids.contains(&r[0])));

    // Together the partitions hold every source row exactly once.
    let mut ids: Vec<f64> = train.rows().chain(test.rows()).map(|r| r[0]).collect();
    ids.sort_by(f64::total_cmp);
    let expected: Vec<f64> = (0..40).map(|i| i as f64).collect();
    assert_eq!(ids, expected);
}

#[test]
fn labels_align_with_partition_rows() {
    let ds = Dataset::with_seed(6)
        .random(50, 4)
        .make_target(TargetFn::Alpha)
        .unwrap()
        .split(0.2)
        .unwrap();

    // Every partition row must map back to a feature row whose Alpha label
    // matches the partition label.
    for (features, labels) in [
        (ds.train_features().unwrap(), ds.train_labels().unwrap()),
        (ds.test_features().unwrap(), ds.test_labels().unwrap()),
    ] {
        for (row, &label) in features.rows().zip(labels) {
            assert_eq!(TargetFn::Alpha.label(row).unwrap(), label);
        }
    }
}
