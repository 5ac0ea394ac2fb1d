//! Property-based tests for the dimensional model using proptest.

use proptest::prelude::*;
use sigo_etl_core::data::model::{CategoryKey, RoleKey, build_dimensional_model};
use sigo_etl_core::data::storage::{render_categories, render_facts, render_roles};
use sigo_etl_core::data::TypedOccurrence;
use std::collections::HashSet;

fn small_text() -> impl Strategy<Value = Option<String>> {
    prop::option::weighted(0.9, prop::sample::select(vec!["fire", "rescue", "medical", "a,b", "q\"x"]))
        .prop_map(|s| s.map(String::from))
}

fn occurrence() -> impl Strategy<Value = TypedOccurrence> {
    (
        "[A-Z][0-9]{1,4}",
        small_text(),
        small_text(),
        small_text(),
        small_text(),
        prop::option::of(-1.0e6f64..1.0e6),
        prop::option::of(-90.0f64..90.0),
    )
        .prop_map(|(id, category, sub, role, priority, ts, lat)| TypedOccurrence {
            occurrence_id: id,
            reported_timestamp: ts,
            arrival_timestamp: ts.map(|t| t + 50.0),
            resolved_timestamp: None,
            latitude: lat,
            longitude: lat.map(|l| l * 2.0),
            priority,
            occurrence_category: category,
            occurrence_subcategory: sub,
            applicant_role: role,
        })
}

proptest! {
    #[test]
    fn fact_count_matches_input(rows in prop::collection::vec(occurrence(), 0..60)) {
        let model = build_dimensional_model(&rows);
        prop_assert_eq!(model.facts.len(), rows.len());
    }

    #[test]
    fn category_dimension_has_one_member_per_distinct_pair(
        rows in prop::collection::vec(occurrence(), 0..60)
    ) {
        let model = build_dimensional_model(&rows);
        let distinct: HashSet<CategoryKey> = rows.iter().map(CategoryKey::of).collect();
        prop_assert_eq!(model.categories.len(), distinct.len());

        let distinct_roles: HashSet<RoleKey> = rows.iter().map(RoleKey::of).collect();
        prop_assert_eq!(model.roles.len(), distinct_roles.len());
    }

    #[test]
    fn surrogate_keys_are_dense(rows in prop::collection::vec(occurrence(), 0..60)) {
        let model = build_dimensional_model(&rows);
        let keys: Vec<u64> = model.categories.iter().map(|(k, _)| k).collect();
        let expected: Vec<u64> = (0..model.categories.len() as u64).collect();
        prop_assert_eq!(keys, expected);

        let keys: Vec<u64> = model.roles.iter().map(|(k, _)| k).collect();
        let expected: Vec<u64> = (0..model.roles.len() as u64).collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn join_back_reproduces_original_triples(rows in prop::collection::vec(occurrence(), 0..60)) {
        let model = build_dimensional_model(&rows);
        for (row, resolved) in rows.iter().zip(model.resolved()) {
            let category = resolved.category.expect("category key resolves");
            let role = resolved.role.expect("role key resolves");
            prop_assert_eq!(&category.occurrence_category, &row.occurrence_category);
            prop_assert_eq!(&category.occurrence_subcategory, &row.occurrence_subcategory);
            prop_assert_eq!(&role.applicant_role, &row.applicant_role);
            prop_assert_eq!(&resolved.fact.occurrence_id, &row.occurrence_id);
        }
    }

    #[test]
    fn rebuilding_yields_identical_tables(rows in prop::collection::vec(occurrence(), 0..60)) {
        let first = build_dimensional_model(&rows);
        let second = build_dimensional_model(&rows);
        prop_assert_eq!(
            render_categories(&first.categories, ','),
            render_categories(&second.categories, ',')
        );
        prop_assert_eq!(render_roles(&first.roles, ','), render_roles(&second.roles, ','));
        prop_assert_eq!(render_facts(&first.facts, ','), render_facts(&second.facts, ','));
    }
}
