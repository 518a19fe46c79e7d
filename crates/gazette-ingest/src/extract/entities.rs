//! Entity candidates from token shape.
//!
//! Approximate by construction: names are guessed from a short surname
//! list, places from administrative suffixes, organizations from
//! institutional characters. Expect false positives (`王朝`) and misses.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const SURNAMES: &[char] = &['张', '王', '李', '赵', '钱', '孙', '周', '吴', '郑', '陈'];
const PLACE_SUFFIXES: &[char] = &['省', '市', '县', '区', '镇', '村', '街', '路'];
const ORG_MARKERS: &[char] = &['局', '部', '会', '院', '所', '校', '厂'];

/// Deduplicated, sorted candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub persons: Vec<String>,
    pub locations: Vec<String>,
    pub organizations: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.locations.is_empty() && self.organizations.is_empty()
    }
}

pub fn extract(tokens: &[&str]) -> Entities {
    let mut persons = BTreeSet::new();
    let mut locations = BTreeSet::new();
    let mut organizations = BTreeSet::new();

    for token in tokens {
        let len = token.chars().count();
        let first = token.chars().next();
        let last = token.chars().last();

        if (2..=3).contains(&len) && first.is_some_and(|c| SURNAMES.contains(&c)) {
            persons.insert(token.to_string());
        }
        if len >= 2 && last.is_some_and(|c| PLACE_SUFFIXES.contains(&c)) {
            locations.insert(token.to_string());
        }
        if len >= 3 && token.chars().any(|c| ORG_MARKERS.contains(&c)) {
            organizations.insert(token.to_string());
        }
    }

    Entities {
        persons: persons.into_iter().collect(),
        locations: locations.into_iter().collect(),
        organizations: organizations.into_iter().collect(),
    }
}
