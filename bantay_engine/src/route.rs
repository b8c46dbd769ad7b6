//! Entity detail routes of the form `/{kind}/{slug}`.
//!
//! Links are built and parsed here only, both through the canonical codec in [`crate::slug`],
//! so a producer and a consumer can never disagree about the slug format.

use std::fmt;

use bantay_data::{EntityKind, UnknownKind};
use thiserror::Error;

use crate::slug;

/// Reasons a path cannot be read as an entity route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route '{0}' does not look like /<kind>/<slug>")]
    Malformed(String),
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),
    #[error("route '{0}' has an empty slug")]
    EmptySlug(String),
}

/// A link target: which kind of entity, and the name to look up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRoute {
    pub kind: EntityKind,
    pub name: String,
}

impl EntityRoute {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self { kind, name: name.into() }
    }

    pub fn slug(&self) -> String {
        slug::encode(&self.name)
    }

    /// The absolute path of this entity's detail page.
    ///
    /// An empty name has no page: it yields `/{kind}/`, which [`EntityRoute::parse`]
    /// rejects with [`RouteError::EmptySlug`]. Check [`EntityRoute::has_page`] before linking.
    pub fn to_path(&self) -> String {
        format!("/{}/{}", self.kind.segment(), self.slug())
    }

    /// Whether this route points at a page that can exist.
    pub fn has_page(&self) -> bool {
        !self.name.is_empty()
    }

    /// Read a route from a request path.
    ///
    /// A leading slash, a single trailing slash and any query string or fragment are ignored.
    /// Malformed percent-escapes in the slug are not an error; the raw segment becomes the
    /// lookup name.
    ///
    /// # Errors
    /// Fails when the path does not have exactly two segments, names an unknown kind, or
    /// has an empty slug.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let bare = path.split(['?', '#']).next().unwrap_or(path);
        let bare = bare.strip_prefix('/').unwrap_or(bare);
        // only a slash after the slug is dropped; `kind/` keeps its empty slug
        let bare = match bare.strip_suffix('/') {
            Some(trimmed) if trimmed.contains('/') => trimmed,
            _ => bare,
        };

        let mut segments = bare.split('/');
        let (Some(kind_segment), Some(slug_segment), None) = (segments.next(), segments.next(), segments.next()) else {
            return Err(RouteError::Malformed(path.to_string()));
        };
        if kind_segment.is_empty() {
            return Err(RouteError::Malformed(path.to_string()));
        }
        let kind = kind_segment.parse::<EntityKind>()?;
        if slug_segment.is_empty() {
            return Err(RouteError::EmptySlug(path.to_string()));
        }

        Ok(Self {
            kind,
            name: slug::decode(slug_segment),
        })
    }
}

impl fmt::Display for EntityRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_paths_with_canonical_slug() {
        let route = EntityRoute::new(EntityKind::Awardees, "ABC Office Supplies Corp.");
        assert_eq!(route.to_path(), "/awardees/abc%20office%20supplies%20corp.");
    }

    #[test]
    fn parses_what_it_builds() {
        for kind in EntityKind::ALL {
            let route = EntityRoute::new(kind, "Dept. of Public Works & Highways");
            let parsed = EntityRoute::parse(&route.to_path()).unwrap();
            assert_eq!(parsed.kind, kind);
            assert_eq!(parsed.name, "dept. of public works & highways");
        }
    }

    #[test]
    fn tolerates_trailing_slash_and_query() {
        let parsed = EntityRoute::parse("locations/cebu%20city/?page=2#top").unwrap();
        assert_eq!(parsed, EntityRoute::new(EntityKind::Locations, "cebu city"));
    }

    #[test]
    fn empty_name_has_no_page() {
        let route = EntityRoute::new(EntityKind::Awardees, "");
        assert!(!route.has_page());
        assert_eq!(route.to_path(), "/awardees/");
        assert_eq!(EntityRoute::parse(&route.to_path()), Err(RouteError::EmptySlug("/awardees/".into())));
        assert!(EntityRoute::new(EntityKind::Awardees, " ").has_page());
    }

    #[test]
    fn malformed_escape_keeps_raw_slug() {
        let parsed = EntityRoute::parse("/categories/%zz").unwrap();
        assert_eq!(parsed.name, "%zz");
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(EntityRoute::parse("/awardees"), Err(RouteError::Malformed("/awardees".into())));
        assert_eq!(
            EntityRoute::parse("/awardees/a/b"),
            Err(RouteError::Malformed("/awardees/a/b".into()))
        );
        assert_eq!(EntityRoute::parse("//x"), Err(RouteError::Malformed("//x".into())));
        assert_eq!(
            EntityRoute::parse("/awardees//"),
            Err(RouteError::EmptySlug("/awardees//".into()))
        );
        assert_eq!(
            EntityRoute::parse("/contractors/acme"),
            Err(RouteError::UnknownKind(UnknownKind("contractors".into())))
        );
    }
}
