//! Audit tooling for the older "slugify" link format.
//!
//! Some generated links used a lossy scheme: lowercase, hyphenate whitespace, drop anything
//! outside `[a-z0-9-]`, and title-case on the way back. Names with punctuation, acronyms or
//! literal hyphens do not survive that trip, and distinct names can share a slug. Routes
//! never use this module; it exists so live names can be checked before the old links are
//! retired.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static OUTSIDE_ALPHABET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("static regex"));
static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex"));

/// Ways a name fails to survive the legacy slug round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugLoss {
    #[error("'{name}' keeps no characters in a legacy slug")]
    Empty { name: String },
    #[error("'{name}' loses {dropped:?} in legacy slug '{slug}'")]
    DroppedCharacters { name: String, slug: String, dropped: Vec<char> },
    #[error("'{name}' comes back as '{restored}' from legacy slug '{slug}'")]
    Altered { name: String, slug: String, restored: String },
}

/// Distinct names that share one legacy slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub slug: String,
    pub names: Vec<String>,
}

/// Apply the legacy lossy transform.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let hyphenated = WHITESPACE_RUN.replace_all(&lowered, "-");
    let stripped = OUTSIDE_ALPHABET.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUN.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// The legacy reverse: capitalize each hyphen-separated token and join with spaces.
pub fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|token| !token.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compute the legacy slug for `name`, failing if the round trip would not give `name` back.
///
/// # Errors
/// Returns the kind of loss detected: an empty slug, characters outside the legacy
/// alphabet, or a reconstruction that differs from the original name.
pub fn audit(name: &str) -> Result<String, SlugLoss> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(SlugLoss::Empty { name: name.to_string() });
    }

    let mut dropped = Vec::new();
    for ch in name.to_lowercase().chars() {
        let kept = ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch.is_whitespace();
        if !kept && !dropped.contains(&ch) {
            dropped.push(ch);
        }
    }
    if !dropped.is_empty() {
        return Err(SlugLoss::DroppedCharacters {
            name: name.to_string(),
            slug,
            dropped,
        });
    }

    let restored = title_case(&slug);
    if restored != name {
        return Err(SlugLoss::Altered {
            name: name.to_string(),
            slug,
            restored,
        });
    }

    Ok(slug)
}

/// Group distinct names that collapse to the same legacy slug, ordered by slug.
pub fn find_collisions<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Collision> {
    let mut by_slug: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in names {
        let group = by_slug.entry(slugify(name)).or_default();
        if !group.iter().any(|known| known == name) {
            group.push(name.to_string());
        }
    }

    by_slug
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(slug, names)| Collision { slug, names })
        .collect()
}
