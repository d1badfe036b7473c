//! Symbol Index
//!
//! The central store mapping FQNs to definitions, plus recorded reference
//! locations. Two tiers compose into the `ProjectIndex`: project code takes
//! precedence over dependency code on lookup. The global fallback retries a
//! bare name in the root namespace; callers enable it only for function
//! calls and constant fetches, which is how PHP falls back at runtime.

use std::collections::HashMap;

use log::debug;
use tower_lsp::lsp_types::{Location, Url};

use crate::indexer::definition::Definition;
use crate::types::Fqn;

// ============================================================================
// ReadableIndex
// ============================================================================

/// Read access to an index. Lookups are total: a miss is `None`, never an
/// error.
pub trait ReadableIndex {
    /// Exact-FQN lookup, project tier before dependencies.
    fn lookup(&self, fqn: &Fqn) -> Option<&Definition>;

    /// Recorded reference locations for an FQN.
    fn references(&self, fqn: &Fqn) -> &[Location];

    /// Lookup with the optional root-namespace retry: when the exact FQN
    /// misses and it carries a namespace prefix, the bare last segment is
    /// tried. Anything found without the fallback is also found with it.
    fn get_definition(&self, fqn: &Fqn, global_fallback: bool) -> Option<&Definition> {
        if let Some(definition) = self.lookup(fqn) {
            return Some(definition);
        }
        if global_fallback && fqn.contains_namespace_separator() {
            return self.lookup(&fqn.last_segment());
        }
        None
    }
}

// ============================================================================
// Index (one tier)
// ============================================================================

/// One tier of definitions and references, with per-document removal.
#[derive(Debug, Default)]
pub struct Index {
    definitions: HashMap<Fqn, Definition>,
    definitions_by_uri: HashMap<Url, Vec<Fqn>>,
    references: HashMap<Fqn, Vec<Location>>,
    references_by_uri: HashMap<Url, Vec<Fqn>>,
}

impl Index {
    pub fn new() -> Self {
        Index::default()
    }

    pub fn get(&self, fqn: &Fqn) -> Option<&Definition> {
        self.definitions.get(fqn)
    }

    pub fn set_definition(&mut self, fqn: Fqn, definition: Definition) {
        let uri = definition.location().uri.clone();
        let slot = self.definitions_by_uri.entry(uri).or_default();
        if !slot.contains(&fqn) {
            slot.push(fqn.clone());
        }
        self.definitions.insert(fqn, definition);
    }

    /// Drops every definition whose declaration points into `uri`.
    pub fn remove_definitions_for_uri(&mut self, uri: &Url) {
        let Some(fqns) = self.definitions_by_uri.remove(uri) else {
            return;
        };
        debug!("removing {} definitions for {}", fqns.len(), uri);
        for fqn in fqns {
            // A newer revision of another document may have reclaimed the
            // FQN; only remove entries still owned by this document.
            if let Some(definition) = self.definitions.get(&fqn) {
                if definition.location().uri == *uri {
                    self.definitions.remove(&fqn);
                }
            }
        }
    }

    pub fn add_reference(&mut self, fqn: Fqn, location: Location) {
        let slot = self.references_by_uri.entry(location.uri.clone()).or_default();
        if !slot.contains(&fqn) {
            slot.push(fqn.clone());
        }
        self.references.entry(fqn).or_default().push(location);
    }

    pub fn remove_references_for_uri(&mut self, uri: &Url) {
        let Some(fqns) = self.references_by_uri.remove(uri) else {
            return;
        };
        for fqn in fqns {
            if let Some(locations) = self.references.get_mut(&fqn) {
                locations.retain(|location| location.uri != *uri);
                if locations.is_empty() {
                    self.references.remove(&fqn);
                }
            }
        }
    }

    pub fn definitions(&self) -> impl Iterator<Item = (&Fqn, &Definition)> {
        self.definitions.iter()
    }

    pub fn definitions_len(&self) -> usize {
        self.definitions.len()
    }
}

impl ReadableIndex for Index {
    fn lookup(&self, fqn: &Fqn) -> Option<&Definition> {
        self.definitions.get(fqn)
    }

    fn references(&self, fqn: &Fqn) -> &[Location] {
        self.references
            .get(fqn)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

// ============================================================================
// ProjectIndex (two tiers)
// ============================================================================

/// Project definitions layered over dependency definitions.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    pub project: Index,
    pub dependencies: Index,
}

impl ProjectIndex {
    pub fn new() -> Self {
        ProjectIndex::default()
    }

    /// Removes everything a document contributed, in both tiers.
    pub fn remove_document(&mut self, uri: &Url) {
        self.project.remove_definitions_for_uri(uri);
        self.project.remove_references_for_uri(uri);
        self.dependencies.remove_definitions_for_uri(uri);
        self.dependencies.remove_references_for_uri(uri);
    }
}

impl ReadableIndex for ProjectIndex {
    fn lookup(&self, fqn: &Fqn) -> Option<&Definition> {
        self.project.lookup(fqn).or_else(|| self.dependencies.lookup(fqn))
    }

    fn references(&self, fqn: &Fqn) -> &[Location] {
        let refs = ReadableIndex::references(&self.project, fqn);
        if refs.is_empty() {
            return ReadableIndex::references(&self.dependencies, fqn);
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::definition::Definition;
    use crate::inferrer::PhpType;
    use tower_lsp::lsp_types::Range;

    fn test_definition(fqn: &str, uri: &str) -> Definition {
        Definition::for_tests(
            Fqn::new(fqn),
            Location {
                uri: Url::parse(uri).unwrap(),
                range: Range::default(),
            },
            PhpType::Mixed,
        )
    }

    fn location(uri: &str) -> Location {
        Location {
            uri: Url::parse(uri).unwrap(),
            range: Range::default(),
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut index = Index::new();
        index.set_definition(
            Fqn::new("A\\B"),
            test_definition("A\\B", "file:///a.php"),
        );
        assert!(index.get(&Fqn::new("A\\B")).is_some());
        assert!(index.get(&Fqn::new("A\\C")).is_none());
    }

    #[test]
    fn test_remove_definitions_for_uri() {
        let mut index = Index::new();
        index.set_definition(
            Fqn::new("A\\B"),
            test_definition("A\\B", "file:///a.php"),
        );
        index.set_definition(Fqn::new("C"), test_definition("C", "file:///c.php"));

        index.remove_definitions_for_uri(&Url::parse("file:///a.php").unwrap());
        assert!(index.get(&Fqn::new("A\\B")).is_none());
        assert!(index.get(&Fqn::new("C")).is_some());
    }

    #[test]
    fn test_project_shadows_dependencies() {
        let mut index = ProjectIndex::new();
        index
            .dependencies
            .set_definition(Fqn::new("C"), test_definition("C", "file:///dep.php"));
        index
            .project
            .set_definition(Fqn::new("C"), test_definition("C", "file:///proj.php"));

        let hit = index.lookup(&Fqn::new("C")).unwrap();
        assert_eq!(hit.location().uri.as_str(), "file:///proj.php");
    }

    #[test]
    fn test_global_fallback_for_callables() {
        let mut index = ProjectIndex::new();
        index
            .project
            .set_definition(Fqn::new("strlen()"), test_definition("strlen()", "file:///stub.php"));

        let namespaced = Fqn::new("App\\strlen()");
        assert!(index.get_definition(&namespaced, false).is_none());
        assert!(index.get_definition(&namespaced, true).is_some());
    }

    #[test]
    fn test_global_fallback_is_monotonic() {
        let mut index = ProjectIndex::new();
        index
            .project
            .set_definition(Fqn::new("A\\f()"), test_definition("A\\f()", "file:///a.php"));

        let fqn = Fqn::new("A\\f()");
        assert!(index.get_definition(&fqn, false).is_some());
        assert!(index.get_definition(&fqn, true).is_some());
    }

    #[test]
    fn test_references_roundtrip() {
        let mut index = Index::new();
        let fqn = Fqn::new("A\\B");
        index.add_reference(fqn.clone(), location("file:///a.php"));
        index.add_reference(fqn.clone(), location("file:///b.php"));
        assert_eq!(ReadableIndex::references(&index, &fqn).len(), 2);

        index.remove_references_for_uri(&Url::parse("file:///a.php").unwrap());
        assert_eq!(ReadableIndex::references(&index, &fqn).len(), 1);
    }
}
