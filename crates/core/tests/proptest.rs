//! Property-based tests for row type unification and value conformance.

use cinder_core::schema::{RowType, Schema};
use cinder_core::{DataType, Error, Value};
use proptest::prelude::*;

fn data_type_strategy() -> impl Strategy<Value = DataType> {
    prop_oneof![
        Just(DataType::Null),
        Just(DataType::Boolean),
        Just(DataType::Int32),
        Just(DataType::Int64),
        Just(DataType::Float64),
        Just(DataType::String),
        Just(DataType::DateTime),
        Just(DataType::Bytes),
    ]
}

fn types_strategy() -> impl Strategy<Value = Vec<DataType>> {
    prop::collection::vec(data_type_strategy(), 1..6)
}

/// A non-NULL value of `ty`, or NULL for the untyped marker.
fn sample(ty: DataType, seed: i64) -> Value {
    match ty {
        DataType::Null => Value::Null,
        DataType::Boolean => Value::Boolean(seed % 2 == 0),
        DataType::Int32 => Value::Int32(seed as i32),
        DataType::Int64 => Value::Int64(seed),
        DataType::Float64 => Value::Float64(seed as f64 / 2.0),
        DataType::String => Value::String(format!("s{}", seed)),
        DataType::DateTime => Value::DateTime(seed),
        DataType::Bytes => Value::Bytes(seed.to_le_bytes().to_vec()),
    }
}

proptest! {
    /// Unification does not depend on argument order, apart from names.
    #[test]
    fn unify_is_symmetric(left in types_strategy(), right in types_strategy()) {
        let schema = Schema::new();
        let a = schema.values_type_of(&left);
        let b = schema.values_type_of(&right);

        match (RowType::unify(&schema, &a, &b), RowType::unify(&schema, &b, &a)) {
            (Ok(ab), Ok(ba)) => prop_assert_eq!(ab.types(), ba.types()),
            (Err(Error::ShapeMismatch { .. }), Err(Error::ShapeMismatch { .. })) => {}
            (ab, ba) => prop_assert!(false, "asymmetric unification: {:?} vs {:?}", ab, ba),
        }
    }

    /// A row type unifies with itself into the same column types.
    #[test]
    fn unify_with_self_keeps_types(types in types_strategy()) {
        let schema = Schema::new();
        let a = schema.values_type_of(&types);

        let merged = RowType::unify(&schema, &a, &a).unwrap();
        prop_assert_eq!(merged.types(), a.types());
        prop_assert_ne!(merged.id(), a.id());
    }

    /// Every row of either input conforms to the unified row type.
    #[test]
    fn unified_type_accepts_input_rows(
        left in types_strategy(),
        right in types_strategy(),
        seed in -1000i64..1000,
    ) {
        let schema = Schema::new();
        let a = schema.values_type_of(&left);
        let b = schema.values_type_of(&right);

        if let Ok(merged) = RowType::unify(&schema, &a, &b) {
            for input in [&a, &b] {
                let row: Vec<Value> = input.types().iter().map(|&ty| sample(ty, seed)).collect();
                prop_assert_eq!(input.check_values(&row), Ok(()));
                prop_assert_eq!(merged.check_values(&row), Ok(()));
            }
        }
    }

    /// A value whose type differs from its column's is reported with both
    /// types.
    #[test]
    fn check_values_reports_first_mismatch(
        types in types_strategy(),
        column in 0usize..6,
        seed in -1000i64..1000,
    ) {
        let column = column % types.len();
        prop_assume!(types[column] != DataType::Int64 && types[column] != DataType::Null);

        let schema = Schema::new();
        let row_type = schema.values_type_of(&types);
        let mut row: Vec<Value> = types.iter().map(|&ty| sample(ty, seed)).collect();
        row[column] = Value::Int64(seed);

        prop_assert_eq!(
            row_type.check_values(&row),
            Err(Error::type_mismatch(types[column], DataType::Int64))
        );
    }
}
