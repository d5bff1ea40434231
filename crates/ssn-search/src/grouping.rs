//! Category and organisation groupings used by the filter dropdowns and the
//! organisation pages.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Serialize, Serializer};
use ssn_core::ServiceRecord;

/// Category bucket key. Missing or blank categories fall into `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryKey {
    Named(String),
    /// Declared last so it sorts after every named category.
    Other,
}

impl CategoryKey {
    #[must_use]
    pub fn from_category(category: Option<&str>) -> Self {
        match category.map(str::trim) {
            Some(c) if !c.is_empty() => Self::Named(c.to_string()),
            _ => Self::Other,
        }
    }

    /// The category name, or `None` for the `Other` bucket.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Other => None,
        }
    }
}

/// `Named` serializes as its name and `Other` as `null`, so a real category
/// called "other" never collides with the catch-all bucket.
impl Serialize for CategoryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Named(name) => serializer.serialize_str(name),
            Self::Other => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBucket {
    pub key: CategoryKey,
    pub is_other: bool,
    pub sub_categories: Vec<String>,
    pub service_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationGroup {
    pub slug: String,
    pub name: String,
    pub services: Vec<ServiceRecord>,
}

/// Group records by category.
///
/// Named buckets come back in key order with `Other` always last. Each
/// bucket's subcategories are deduplicated and sorted; blank ones are skipped.
#[must_use]
pub fn group_by_category(records: &[ServiceRecord]) -> Vec<CategoryBucket> {
    let mut buckets: BTreeMap<CategoryKey, (BTreeSet<String>, usize)> = BTreeMap::new();

    for record in records {
        let entry = buckets
            .entry(CategoryKey::from_category(record.category.as_deref()))
            .or_default();
        if let Some(sub) = record.sub_category.as_deref().map(str::trim) {
            if !sub.is_empty() {
                entry.0.insert(sub.to_string());
            }
        }
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(key, (subs, count))| CategoryBucket {
            is_other: key == CategoryKey::Other,
            key,
            sub_categories: subs.into_iter().collect(),
            service_count: count,
        })
        .collect()
}

/// Group records by organisation slug, in order of first appearance.
#[must_use]
pub fn group_by_organisation(records: &[ServiceRecord]) -> Vec<OrganisationGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<OrganisationGroup> = Vec::new();

    for record in records {
        let slug = record.organisation_slug.as_str();
        if let Some(&i) = index.get(slug) {
            groups[i].services.push(record.clone());
        } else {
            index.insert(slug, groups.len());
            groups.push(OrganisationGroup {
                slug: slug.to_string(),
                name: record.organisation.clone(),
                services: vec![record.clone()],
            });
        }
    }

    groups
}
