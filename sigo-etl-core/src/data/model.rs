//! Star schema: category and applicant-role dimensions plus the occurrence fact.
//!
//! Surrogate keys are dense, 0-based and assigned in first-seen order, so the
//! same input in the same order always yields the same keys.

use crate::data::record::TypedOccurrence;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Surrogate key type of every dimension.
pub type SurrogateKey = u64;

/// An ordered set of distinct members with surrogate keys.
///
/// The key of a member is its position in `members`.
#[derive(Debug, Clone)]
pub struct Dimension<K> {
    members: Vec<K>,
    index: HashMap<K, SurrogateKey>,
}

impl<K> Default for Dimension<K> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Dimension<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project, deduplicate and key the given values in first-seen order.
    pub fn from_values(values: impl IntoIterator<Item = K>) -> Self {
        let mut dim = Self::new();
        for value in values {
            dim.insert(value);
        }
        dim
    }

    /// Add a member if unseen; returns its key either way.
    pub fn insert(&mut self, member: K) -> SurrogateKey {
        if let Some(&key) = self.index.get(&member) {
            return key;
        }
        let key = self.members.len() as SurrogateKey;
        self.index.insert(member.clone(), key);
        self.members.push(member);
        key
    }

    /// Left-join probe: the key of `member`, or `None` when it is absent.
    pub fn lookup(&self, member: &K) -> Option<SurrogateKey> {
        self.index.get(member).copied()
    }

    /// Member stored under `key`.
    pub fn get(&self, key: SurrogateKey) -> Option<&K> {
        self.members.get(key as usize)
    }

    /// `(key, member)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (SurrogateKey, &K)> {
        self.members
            .iter()
            .enumerate()
            .map(|(i, member)| (i as SurrogateKey, member))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Natural key of the category dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub occurrence_category: Option<String>,
    pub occurrence_subcategory: Option<String>,
}

impl CategoryKey {
    pub fn of(row: &TypedOccurrence) -> Self {
        Self {
            occurrence_category: row.occurrence_category.clone(),
            occurrence_subcategory: row.occurrence_subcategory.clone(),
        }
    }
}

/// Natural key of the applicant-role dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleKey {
    pub applicant_role: Option<String>,
}

impl RoleKey {
    pub fn of(row: &TypedOccurrence) -> Self {
        Self {
            applicant_role: row.applicant_role.clone(),
        }
    }
}

pub type CategoryDimension = Dimension<CategoryKey>;
pub type ApplicantRoleDimension = Dimension<RoleKey>;

/// One fact row per occurrence, with dimension attributes replaced by keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceFact {
    pub occurrence_id: String,
    pub categoria_id: Option<SurrogateKey>,
    pub applicant_role_id: Option<SurrogateKey>,
    pub priority: Option<String>,
    pub reported_timestamp: Option<f64>,
    pub arrival_timestamp: Option<f64>,
    pub resolved_timestamp: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A fact joined back to its dimension members.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFact<'a> {
    pub fact: &'a OccurrenceFact,
    pub category: Option<&'a CategoryKey>,
    pub role: Option<&'a RoleKey>,
}

/// The dimensional model produced by one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct StarSchema {
    pub categories: CategoryDimension,
    pub roles: ApplicantRoleDimension,
    pub facts: Vec<OccurrenceFact>,
}

impl StarSchema {
    /// Join a fact back to its dimensions through its surrogate keys.
    pub fn resolve<'a>(&'a self, fact: &'a OccurrenceFact) -> ResolvedFact<'a> {
        ResolvedFact {
            fact,
            category: fact.categoria_id.and_then(|k| self.categories.get(k)),
            role: fact.applicant_role_id.and_then(|k| self.roles.get(k)),
        }
    }

    /// Every fact joined back to its dimensions, in fact order.
    pub fn resolved(&self) -> impl Iterator<Item = ResolvedFact<'_>> {
        self.facts.iter().map(|fact| self.resolve(fact))
    }
}

/// Build both dimensions from `rows` and left-join their keys onto one fact per row.
pub fn build_dimensional_model(rows: &[TypedOccurrence]) -> StarSchema {
    let categories = CategoryDimension::from_values(rows.iter().map(CategoryKey::of));
    let roles = ApplicantRoleDimension::from_values(rows.iter().map(RoleKey::of));
    let facts = join_facts(rows, &categories, &roles);
    StarSchema {
        categories,
        roles,
        facts,
    }
}

/// Left join: every row yields exactly one fact; a dimension miss leaves the key null.
pub fn join_facts(
    rows: &[TypedOccurrence],
    categories: &CategoryDimension,
    roles: &ApplicantRoleDimension,
) -> Vec<OccurrenceFact> {
    rows.iter()
        .map(|row| OccurrenceFact {
            occurrence_id: row.occurrence_id.clone(),
            categoria_id: categories.lookup(&CategoryKey::of(row)),
            applicant_role_id: roles.lookup(&RoleKey::of(row)),
            priority: row.priority.clone(),
            reported_timestamp: row.reported_timestamp,
            arrival_timestamp: row.arrival_timestamp,
            resolved_timestamp: row.resolved_timestamp,
            latitude: row.latitude,
            longitude: row.longitude,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn occurrence(id: &str, category: &str, sub: &str, role: &str) -> TypedOccurrence {
        TypedOccurrence {
            occurrence_id: id.to_string(),
            reported_timestamp: Some(1000.0),
            arrival_timestamp: Some(1050.0),
            resolved_timestamp: Some(1200.0),
            latitude: Some(-23.5),
            longitude: Some(-46.6),
            priority: Some("high".to_string()),
            occurrence_category: Some(category.to_string()),
            occurrence_subcategory: Some(sub.to_string()),
            applicant_role: Some(role.to_string()),
        }
    }

    #[test]
    fn test_single_row_model() {
        let model = build_dimensional_model(&[occurrence("A1", "fire", "structure", "citizen")]);

        let categories: Vec<_> = model.categories.iter().collect();
        assert_eq!(
            categories,
            vec![(
                0,
                &CategoryKey {
                    occurrence_category: Some("fire".into()),
                    occurrence_subcategory: Some("structure".into()),
                }
            )]
        );
        assert_eq!(model.roles.len(), 1);
        assert_eq!(model.facts.len(), 1);
        assert_eq!(
            model.facts[0],
            OccurrenceFact {
                occurrence_id: "A1".into(),
                categoria_id: Some(0),
                applicant_role_id: Some(0),
                priority: Some("high".into()),
                reported_timestamp: Some(1000.0),
                arrival_timestamp: Some(1050.0),
                resolved_timestamp: Some(1200.0),
                latitude: Some(-23.5),
                longitude: Some(-46.6),
            }
        );
    }

    #[test]
    fn test_keys_follow_first_seen_order() {
        let rows = vec![
            occurrence("1", "rescue", "water", "admin"),
            occurrence("2", "fire", "structure", "citizen"),
            occurrence("3", "rescue", "water", "citizen"),
            occurrence("4", "fire", "vehicle", "admin"),
            occurrence("5", "fire", "structure", "firefighter"),
        ];
        let model = build_dimensional_model(&rows);

        let cats: Vec<_> = model
            .categories
            .iter()
            .map(|(k, c)| {
                (
                    k,
                    c.occurrence_category.as_deref().unwrap(),
                    c.occurrence_subcategory.as_deref().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            cats,
            vec![
                (0, "rescue", "water"),
                (1, "fire", "structure"),
                (2, "fire", "vehicle"),
            ]
        );

        let role_ids: Vec<_> = model.facts.iter().map(|f| f.applicant_role_id).collect();
        assert_eq!(role_ids, vec![Some(0), Some(1), Some(1), Some(0), Some(2)]);
        let cat_ids: Vec<_> = model.facts.iter().map(|f| f.categoria_id).collect();
        assert_eq!(cat_ids, vec![Some(0), Some(1), Some(0), Some(2), Some(1)]);
    }

    #[test]
    fn test_same_subcategory_under_different_categories_is_distinct() {
        let rows = vec![
            occurrence("1", "fire", "other", "admin"),
            occurrence("2", "rescue", "other", "admin"),
        ];
        let model = build_dimensional_model(&rows);
        assert_eq!(model.categories.len(), 2);
    }

    #[test]
    fn test_null_members_join_like_any_value() {
        let mut row = occurrence("1", "fire", "structure", "admin");
        row.occurrence_subcategory = None;
        row.applicant_role = None;
        let model = build_dimensional_model(&[row]);

        assert_eq!(model.facts[0].categoria_id, Some(0));
        assert_eq!(model.facts[0].applicant_role_id, Some(0));
        assert_eq!(model.roles.get(0), Some(&RoleKey { applicant_role: None }));
    }

    #[test]
    fn test_left_join_miss_keeps_the_row() {
        let rows = vec![
            occurrence("1", "fire", "structure", "admin"),
            occurrence("2", "rescue", "water", "citizen"),
        ];
        // Dimensions built from the first row only.
        let categories = CategoryDimension::from_values(rows[..1].iter().map(CategoryKey::of));
        let roles = ApplicantRoleDimension::from_values(rows[..1].iter().map(RoleKey::of));

        let facts = join_facts(&rows, &categories, &roles);
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].categoria_id, Some(0));
        assert_eq!(facts[1].categoria_id, None);
        assert_eq!(facts[1].applicant_role_id, None);
        assert_eq!(facts[1].occurrence_id, "2");
    }

    #[test]
    fn test_resolve_round_trip() {
        let rows = vec![
            occurrence("1", "fire", "structure", "admin"),
            occurrence("2", "rescue", "water", "citizen"),
            occurrence("3", "fire", "structure", "citizen"),
        ];
        let model = build_dimensional_model(&rows);
        for (row, resolved) in rows.iter().zip(model.resolved()) {
            assert_eq!(resolved.fact.occurrence_id, row.occurrence_id);
            assert_eq!(resolved.category, Some(&CategoryKey::of(row)));
            assert_eq!(resolved.role, Some(&RoleKey::of(row)));
        }
    }

    #[test]
    fn test_empty_input() {
        let model = build_dimensional_model(&[]);
        assert!(model.categories.is_empty());
        assert!(model.roles.is_empty());
        assert!(model.facts.is_empty());
    }

    #[test]
    fn test_insert_returns_existing_key() {
        let mut dim = Dimension::new();
        assert_eq!(dim.insert("a"), 0);
        assert_eq!(dim.insert("b"), 1);
        assert_eq!(dim.insert("a"), 0);
        assert_eq!(dim.len(), 2);
        assert_eq!(dim.lookup(&"c"), None);
    }
}
