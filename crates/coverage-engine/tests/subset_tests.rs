//! Index- and value-subsetting behavior across the coverage contract.

mod common;

use std::sync::Arc;

use coverage_engine::{
    subset_by_bbox, ArrayCoverage, Axis, AxisBounds, Coverage, CoverageError, Domain,
    IndexConstraint, IndexConstraints, Parameter, ReferenceSystemConnection, ValueConstraint,
    ValueConstraints,
};

use common::{cell, crs84, grid_domain, grid_values, temperature_coverage};

fn index_constraints(entries: &[(&str, IndexConstraint)]) -> IndexConstraints {
    entries
        .iter()
        .map(|(key, constraint)| (key.to_string(), *constraint))
        .collect()
}

fn value_constraints(entries: &[(&str, ValueConstraint)]) -> ValueConstraints {
    entries
        .iter()
        .map(|(key, constraint)| (key.to_string(), constraint.clone()))
        .collect()
}

#[tokio::test]
async fn test_full_range_subset_is_identity() {
    let cov = temperature_coverage();
    let subset = cov.subset_by_index(&IndexConstraints::new()).await.unwrap();

    let domain = cov.load_domain().await.unwrap();
    let subset_domain = subset.load_domain().await.unwrap();
    for axis in domain.axes() {
        assert_eq!(
            subset_domain.axis(&axis.key).unwrap().values.as_numbers(),
            axis.values.as_numbers()
        );
    }

    let range = cov.load_range("TMP").await.unwrap();
    let subset_range = subset.load_range("TMP").await.unwrap();
    for x in 0..4 {
        for y in 0..4 {
            assert_eq!(subset_range.get(&cell(x, y)), range.get(&cell(x, y)));
        }
    }
}

#[tokio::test]
async fn test_subset_does_not_mutate_source() {
    let cov = temperature_coverage();
    let _subset = cov
        .subset_by_index(&index_constraints(&[("x", IndexConstraint::Index(1))]))
        .await
        .unwrap();

    let domain = cov.load_domain().await.unwrap();
    assert_eq!(
        domain.axis("x").unwrap().values.as_numbers().unwrap(),
        &[0.0, 10.0, 20.0, 30.0]
    );
    let range = cov.load_range("TMP").await.unwrap();
    assert_eq!(range.get(&cell(3, 0)), Some(18.7));
    assert_eq!(range.shape()["x"], 4);
}

#[tokio::test]
async fn test_bare_index_selects_one() {
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_index(&index_constraints(&[("x", IndexConstraint::Index(2))]))
        .await
        .unwrap();

    let domain = subset.load_domain().await.unwrap();
    assert_eq!(domain.axis("x").unwrap().values.as_numbers().unwrap(), &[20.0]);

    let range = subset.load_range("TMP").await.unwrap();
    assert_eq!(range.shape()["x"], 1);
    assert_eq!(range.shape()["y"], 4);
    // x index 0 of the subset maps to source x index 2
    assert_eq!(range.get(&cell(0, 2)), Some(21.1));
}

#[tokio::test]
async fn test_strided_subset_translates_indices() {
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_index(&index_constraints(&[(
            "x",
            IndexConstraint::strided(1, 4, 2),
        )]))
        .await
        .unwrap();

    let domain = subset.load_domain().await.unwrap();
    assert_eq!(
        domain.axis("x").unwrap().values.as_numbers().unwrap(),
        &[10.0, 30.0]
    );

    let range = subset.load_range("TMP").await.unwrap();
    // subset x=1 -> source x=3
    assert_eq!(range.get(&cell(1, 0)), Some(18.7));
    assert_eq!(range.get(&cell(0, 3)), Some(21.3));
}

#[tokio::test]
async fn test_missing_index_keys_default_to_zero() {
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_index(&index_constraints(&[
            ("x", IndexConstraint::range(2, 4)),
            ("y", IndexConstraint::Index(1)),
        ]))
        .await
        .unwrap();

    let range = subset.load_range("TMP").await.unwrap();
    // empty index: x defaults to subset 0 -> source 2, y -> source 1
    assert_eq!(range.get(&coverage_engine::GridIndex::new()), Some(17.2));
}

#[tokio::test]
async fn test_recursive_subsetting() {
    let cov = temperature_coverage();
    let first = cov
        .subset_by_index(&index_constraints(&[("x", IndexConstraint::range(1, 4))]))
        .await
        .unwrap();
    let second = first
        .subset_by_index(&index_constraints(&[("x", IndexConstraint::Index(1))]))
        .await
        .unwrap();

    let domain = second.load_domain().await.unwrap();
    assert_eq!(domain.axis("x").unwrap().values.as_numbers().unwrap(), &[20.0]);

    let range = second.load_range("TMP").await.unwrap();
    assert_eq!(range.get(&cell(0, 2)), Some(21.1));
}

#[tokio::test]
async fn test_invalid_constraints_rejected() {
    let cov = temperature_coverage();
    for constraint in [
        IndexConstraint::strided(0, 2, 0),
        IndexConstraint::range(2, 2),
        IndexConstraint::range(0, 9),
    ] {
        let result = cov
            .subset_by_index(&index_constraints(&[("x", constraint)]))
            .await;
        assert!(matches!(
            result,
            Err(CoverageError::InvalidConstraint { .. })
        ));
    }
}

#[tokio::test]
async fn test_unknown_axes_ignored() {
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_index(&index_constraints(&[("level", IndexConstraint::Index(7))]))
        .await
        .unwrap();
    let domain = subset.load_domain().await.unwrap();
    assert_eq!(domain.axes().len(), 2);
}

#[tokio::test]
async fn test_bounds_reindexed_lazily() {
    let domain = Domain::new(
        Some("Grid".to_string()),
        vec![
            Axis::primitive("x", vec![5.0, 15.0, 25.0, 35.0]).with_bounds(AxisBounds::new(vec![
                (0.0, 10.0),
                (10.0, 20.0),
                (20.0, 30.0),
                (30.0, 40.0),
            ])),
        ],
        vec![],
    )
    .unwrap();
    let cov = Arc::new(
        ArrayCoverage::from_grid(
            domain,
            Parameter::new("p", "P"),
            &["x"],
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
        )
        .unwrap(),
    );

    let subset = cov
        .subset_by_index(&index_constraints(&[(
            "x",
            IndexConstraint::strided(1, 4, 2),
        )]))
        .await
        .unwrap();
    let domain = subset.load_domain().await.unwrap();
    let bounds = domain.axis("x").unwrap().bounds.as_ref().unwrap();
    assert_eq!(bounds.get(0), Some((10.0, 20.0)));
    assert_eq!(bounds.get(1), Some((30.0, 40.0)));
}

#[tokio::test]
async fn test_subset_by_value_exact_and_nearest() {
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_value(&value_constraints(&[
            ("x", ValueConstraint::exact(20.0)),
            ("y", ValueConstraint::nearest(51.0)),
        ]))
        .await
        .unwrap();

    let domain = subset.load_domain().await.unwrap();
    assert_eq!(domain.axis("x").unwrap().values.as_numbers().unwrap(), &[20.0]);
    // nearest to 51 in [54, 52, 50, 48]: 52 and 50 tie, lower index wins
    assert_eq!(domain.axis("y").unwrap().values.as_numbers().unwrap(), &[52.0]);

    let range = subset.load_range("TMP").await.unwrap();
    assert_eq!(range.get(&cell(0, 0)), Some(17.2));
}

#[tokio::test]
async fn test_subset_by_value_longitude_wrap() {
    let cov = temperature_coverage();
    // -340 wraps into the x window as 20
    let subset = cov
        .subset_by_value(&value_constraints(&[("x", ValueConstraint::exact(-340.0))]))
        .await
        .unwrap();
    let domain = subset.load_domain().await.unwrap();
    assert_eq!(domain.axis("x").unwrap().values.as_numbers().unwrap(), &[20.0]);
}

#[tokio::test]
async fn test_subset_by_value_interval_over_includes() {
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_value(&value_constraints(&[(
            "x",
            ValueConstraint::interval(12.0, 18.0),
        )]))
        .await
        .unwrap();
    let domain = subset.load_domain().await.unwrap();
    // both endpoints bracket to {1, 2}: indices 1..3 stay selected
    assert_eq!(
        domain.axis("x").unwrap().values.as_numbers().unwrap(),
        &[10.0, 20.0]
    );
}

#[tokio::test]
async fn test_subset_by_value_not_found() {
    let cov = temperature_coverage();
    let result = cov
        .subset_by_value(&value_constraints(&[("x", ValueConstraint::exact(15.0))]))
        .await;
    assert!(matches!(result, Err(CoverageError::ValueNotFound { .. })));
}

#[tokio::test]
async fn test_subset_by_value_iso_dates() {
    let domain = Domain::new(
        Some("PointSeries".to_string()),
        vec![
            Axis::primitive(
                "t",
                vec![
                    "2024-12-29T12:00:00Z",
                    "2024-12-29T13:00:00Z",
                    "2024-12-29T14:00:00Z",
                ],
            ),
        ],
        vec![],
    )
    .unwrap();
    let cov = Arc::new(
        ArrayCoverage::from_grid(
            domain,
            Parameter::new("TMP", "Air temperature"),
            &["t"],
            vec![Some(288.5), Some(289.0), Some(289.5)],
        )
        .unwrap(),
    );

    let subset = cov
        .subset_by_value(&value_constraints(&[(
            "t",
            ValueConstraint::nearest("2024-12-29T13:10:00Z"),
        )]))
        .await
        .unwrap();
    let domain = subset.load_domain().await.unwrap();
    assert_eq!(
        domain.axis("t").unwrap().values.as_strings().unwrap(),
        &["2024-12-29T13:00:00Z".to_string()]
    );

    let range = subset.load_range("TMP").await.unwrap();
    assert_eq!(range.get(&coverage_engine::GridIndex::new()), Some(289.0));
}

#[tokio::test]
async fn test_subset_by_bbox_matches_intervals() {
    let cov = temperature_coverage();
    let by_bbox = subset_by_bbox(cov.clone(), [5.0, 49.0, 25.0, 53.0], ["x", "y"])
        .await
        .unwrap();
    let by_value = cov
        .subset_by_value(&value_constraints(&[
            ("x", ValueConstraint::interval(5.0, 25.0)),
            ("y", ValueConstraint::interval(49.0, 53.0)),
        ]))
        .await
        .unwrap();

    let a = by_bbox.load_domain().await.unwrap();
    let b = by_value.load_domain().await.unwrap();
    assert_eq!(
        a.axis("x").unwrap().values.as_numbers(),
        b.axis("x").unwrap().values.as_numbers()
    );
    assert_eq!(
        a.axis("y").unwrap().values.as_numbers(),
        b.axis("y").unwrap().values.as_numbers()
    );
}

#[tokio::test]
async fn test_descending_axis_value_subset() {
    // grid_domain's y axis is descending [54, 52, 50, 48]
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_value(&value_constraints(&[(
            "y",
            ValueConstraint::interval(49.0, 53.0),
        )]))
        .await
        .unwrap();
    let domain = subset.load_domain().await.unwrap();
    let selected = domain.axis("y").unwrap().values.as_numbers().unwrap();
    assert!(selected.contains(&52.0));
    assert!(selected.contains(&50.0));
}

#[tokio::test]
async fn test_domain_values_shared_on_identity() {
    // the untouched y axis of an x-only subset shares the source storage
    let domain = grid_domain();
    let source_values = domain.axis("y").unwrap().values.clone();
    let cov = Arc::new(
        ArrayCoverage::from_grid(
            domain,
            Parameter::new("TMP", "Air temperature"),
            &["y", "x"],
            grid_values(),
        )
        .unwrap(),
    );

    let subset = cov
        .subset_by_index(&index_constraints(&[("x", IndexConstraint::range(0, 2))]))
        .await
        .unwrap();
    let subset_domain = subset.load_domain().await.unwrap();
    match (&source_values, &subset_domain.axis("y").unwrap().values) {
        (
            coverage_engine::AxisValues::Numbers(a),
            coverage_engine::AxisValues::Numbers(b),
        ) => assert!(b.shares_storage_with(&a)),
        _ => panic!("expected numeric axes"),
    }
}

#[tokio::test]
async fn test_referencing_carried_through() {
    let cov = temperature_coverage();
    let subset = cov
        .subset_by_index(&index_constraints(&[("x", IndexConstraint::Index(0))]))
        .await
        .unwrap();
    let domain = subset.load_domain().await.unwrap();
    assert_eq!(
        domain.referencing,
        vec![ReferenceSystemConnection::new(
            vec!["x".to_string(), "y".to_string()],
            crs84(),
        )]
    );
}
