//! Prefix-tree path matcher.
//!
//! One [`Trie`] per HTTP method stores every registered pattern for that
//! method. A pattern is split into `/`-delimited segments; each segment
//! becomes one tree node. Three segment kinds exist:
//!
//! - literal (`users`) matches the identical text,
//! - named (`:id`) matches exactly one segment and binds it,
//! - wildcard (`*filepath`) matches one-or-more remaining segments,
//!   joined by `/`, and must be the final segment of its pattern.
//!
//! Lookup walks the tree depth-first in child-registration order; the first
//! path that consumes the whole input and lands on a terminal node wins.
//! The tree is built during configuration and is read-only at request time.

use std::collections::HashMap;

use crate::error::Error;

/// One path segment. Terminal nodes record the full pattern they complete.
struct Node {
    part: String,
    wild: bool,
    pattern: Option<String>,
    children: Vec<Node>,
}

impl Node {
    fn new(part: &str) -> Self {
        Self {
            part: part.to_owned(),
            wild: is_wild(part),
            pattern: None,
            children: Vec::new(),
        }
    }
}

fn is_wild(part: &str) -> bool {
    part.starts_with(':') || part.starts_with('*')
}

/// Splits a pattern or concrete path into segments, discarding empties.
/// `/a/` and `/a` therefore parse identically, and `/` parses to nothing.
pub(crate) fn parse_pattern(pattern: &str) -> Vec<&str> {
    pattern.split('/').filter(|part| !part.is_empty()).collect()
}

pub(crate) struct Trie {
    root: Node,
}

impl Trie {
    pub(crate) fn new() -> Self {
        Self { root: Node::new("") }
    }

    /// Registers `pattern`, rejecting structural duplicates and misplaced
    /// wildcards.
    ///
    /// Two patterns are structural duplicates when they land on the same
    /// node: identical literals, or a parameter/wildcard segment in a
    /// position where another already sits (`/a/:x` vs `/a/:y`). Parameter
    /// names do not disambiguate.
    pub(crate) fn insert(&mut self, pattern: &str) -> Result<(), Error> {
        let parts = parse_pattern(pattern);

        if let Some(pos) = parts.iter().position(|part| part.starts_with('*')) {
            if pos != parts.len() - 1 {
                return Err(Error::WildcardNotLast { pattern: pattern.to_owned() });
            }
        }

        if let Some(existing) = self.structural_lookup(&parts) {
            return Err(Error::RouteConflict {
                pattern: pattern.to_owned(),
                existing: existing.to_owned(),
            });
        }

        let mut node = &mut self.root;
        for part in &parts {
            // A node owns at most one wild child: any later named/wildcard
            // segment at this position merges into it (and conflicts if it
            // would terminate there).
            let pos = node
                .children
                .iter()
                .position(|child| child.part == *part || (child.wild && is_wild(part)));
            let pos = match pos {
                Some(pos) => pos,
                None => {
                    node.children.push(Node::new(part));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[pos];
        }
        node.pattern = Some(pattern.to_owned());
        Ok(())
    }

    /// Resolves a concrete path to the first matching registered pattern
    /// and its parameter bindings. Absence is a valid outcome, not an error.
    pub(crate) fn search(&self, path: &str) -> Option<(&str, HashMap<String, String>)> {
        let parts = parse_pattern(path);
        let node = search_in(&self.root, &parts)?;
        let pattern = node.pattern.as_deref()?;
        Some((pattern, bind_params(pattern, &parts)))
    }

    /// Walks the tree with the *insertion* matching policy: literals match
    /// byte-exactly, wild segments match only the existing wild child.
    /// Returns the terminal pattern already occupying the landing node.
    fn structural_lookup(&self, parts: &[&str]) -> Option<&str> {
        let mut node = &self.root;
        for part in parts {
            node = node
                .children
                .iter()
                .find(|child| child.part == *part || (child.wild && is_wild(part)))?;
        }
        node.pattern.as_deref()
    }
}

/// Depth-first match in child-registration order. At each level every child
/// whose text equals the segment, plus every wild child, is a candidate; the
/// first candidate whose subtree consumes the remaining input and ends on a
/// terminal node wins, and no further candidates are tried.
fn search_in<'t>(node: &'t Node, parts: &[&str]) -> Option<&'t Node> {
    let Some((segment, rest)) = parts.split_first() else {
        return node.pattern.is_some().then_some(node);
    };

    for child in node.children.iter().filter(|c| c.part == *segment || c.wild) {
        // A wildcard swallows the rest of the path outright.
        if child.part.starts_with('*') {
            return child.pattern.is_some().then_some(child);
        }
        if let Some(found) = search_in(child, rest) {
            return Some(found);
        }
    }
    None
}

/// Re-walks the matched pattern in lockstep with the concrete segments:
/// `:name` binds one segment, `*name` binds the `/`-joined remainder and
/// ends the walk.
fn bind_params(pattern: &str, concrete: &[&str]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (i, (part, segment)) in parse_pattern(pattern).iter().zip(concrete).enumerate() {
        if let Some(name) = part.strip_prefix(':') {
            params.insert(name.to_owned(), (*segment).to_owned());
        } else if let Some(name) = part.strip_prefix('*') {
            params.insert(name.to_owned(), concrete[i..].join("/"));
            break;
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_discards_empty_segments() {
        assert!(parse_pattern("/").is_empty());
        assert_eq!(parse_pattern("/p/:lang/doc"), vec!["p", ":lang", "doc"]);
        assert_eq!(parse_pattern("/a/"), parse_pattern("/a"));
        assert_eq!(parse_pattern("//a///b"), vec!["a", "b"]);
    }

    #[test]
    fn parse_round_trips_modulo_slashes() {
        for pattern in ["/hello/:name", "/static/*filepath", "/p/:lang/doc"] {
            let rejoined = format!("/{}", parse_pattern(pattern).join("/"));
            assert_eq!(rejoined, pattern);
        }
    }

    #[test]
    fn literal_and_param_share_a_prefix() {
        let mut tree = Trie::new();
        tree.insert("/hello").unwrap();
        tree.insert("/hello/:name").unwrap();

        let (pattern, params) = tree.search("/hello/world").unwrap();
        assert_eq!(pattern, "/hello/:name");
        assert_eq!(params["name"], "world");

        let (pattern, params) = tree.search("/hello").unwrap();
        assert_eq!(pattern, "/hello");
        assert!(params.is_empty());
    }

    #[test]
    fn wildcard_binds_joined_remainder() {
        let mut tree = Trie::new();
        tree.insert("/static/*filepath").unwrap();

        let (pattern, params) = tree.search("/static/css/a.css").unwrap();
        assert_eq!(pattern, "/static/*filepath");
        assert_eq!(params["filepath"], "css/a.css");

        let (_, params) = tree.search("/static/favicon.ico").unwrap();
        assert_eq!(params["filepath"], "favicon.ico");
    }

    #[test]
    fn wildcard_needs_at_least_one_segment() {
        let mut tree = Trie::new();
        tree.insert("/static/*filepath").unwrap();
        assert!(tree.search("/static").is_none());
    }

    #[test]
    fn wildcard_must_be_final_segment() {
        let mut tree = Trie::new();
        let err = tree.insert("/a/*rest/b").unwrap_err();
        assert!(matches!(err, Error::WildcardNotLast { .. }));
    }

    #[test]
    fn duplicate_param_patterns_conflict() {
        let mut tree = Trie::new();
        tree.insert("/a/:x").unwrap();
        let err = tree.insert("/a/:y").unwrap_err();
        match err {
            Error::RouteConflict { existing, .. } => assert_eq!(existing, "/a/:x"),
            other => panic!("expected RouteConflict, got {other:?}"),
        }
    }

    #[test]
    fn exact_duplicate_conflicts() {
        let mut tree = Trie::new();
        tree.insert("/hello/world").unwrap();
        assert!(tree.insert("/hello/world").is_err());
    }

    #[test]
    fn param_and_wildcard_occupy_the_same_slot() {
        let mut tree = Trie::new();
        tree.insert("/files/:name").unwrap();
        assert!(tree.insert("/files/*rest").is_err());
    }

    #[test]
    fn literal_beside_param_is_not_a_conflict() {
        // Either insertion order must work; the duplicate probe walks the
        // tree structurally rather than matching the new pattern as if it
        // were a request path.
        let mut tree = Trie::new();
        tree.insert("/user/:id").unwrap();
        tree.insert("/user/list").unwrap();

        let (pattern, params) = tree.search("/user/list").unwrap();
        assert_eq!(pattern, "/user/:id");
        assert_eq!(params["id"], "list");

        let mut tree = Trie::new();
        tree.insert("/user/list").unwrap();
        tree.insert("/user/:id").unwrap();

        let (pattern, _) = tree.search("/user/list").unwrap();
        assert_eq!(pattern, "/user/list");
        let (pattern, params) = tree.search("/user/42").unwrap();
        assert_eq!(pattern, "/user/:id");
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn first_registered_candidate_wins() {
        let mut tree = Trie::new();
        tree.insert("/p/:lang/doc").unwrap();
        tree.insert("/p/rust/:page").unwrap();

        // ":lang" was registered first and its subtree completes the match,
        // so the later, more specific sibling is never consulted.
        let (pattern, params) = tree.search("/p/rust/doc").unwrap();
        assert_eq!(pattern, "/p/:lang/doc");
        assert_eq!(params["lang"], "rust");

        // The second tree only matches where the first one cannot.
        let (pattern, params) = tree.search("/p/rust/intro").unwrap();
        assert_eq!(pattern, "/p/rust/:page");
        assert_eq!(params["page"], "intro");
    }

    #[test]
    fn backtracks_out_of_dead_end_subtrees() {
        let mut tree = Trie::new();
        tree.insert("/a/b/c").unwrap();
        tree.insert("/a/:x/d").unwrap();

        // "b" matches the literal child first, but that subtree has no "d";
        // the search falls back to the wild sibling.
        let (pattern, params) = tree.search("/a/b/d").unwrap();
        assert_eq!(pattern, "/a/:x/d");
        assert_eq!(params["x"], "b");
    }

    #[test]
    fn root_pattern_is_registrable() {
        let mut tree = Trie::new();
        tree.insert("/").unwrap();
        let (pattern, params) = tree.search("/").unwrap();
        assert_eq!(pattern, "/");
        assert!(params.is_empty());
        assert!(tree.insert("/").is_err());
    }

    #[test]
    fn trailing_slash_is_not_distinct() {
        let mut tree = Trie::new();
        tree.insert("/hello").unwrap();
        assert!(tree.search("/hello/").is_some());
        assert!(tree.insert("/hello/").is_err());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let mut tree = Trie::new();
        tree.insert("/Hello").unwrap();
        assert!(tree.search("/hello").is_none());
        assert!(tree.search("/Hello").is_some());
    }

    #[test]
    fn prefix_without_terminal_does_not_match() {
        let mut tree = Trie::new();
        tree.insert("/hello/world").unwrap();
        assert!(tree.search("/hello").is_none());
        assert!(tree.search("/hello/world/extra").is_none());
    }

    #[test]
    fn multiple_params_bind_positionally() {
        let mut tree = Trie::new();
        tree.insert("/p/:lang/:page").unwrap();
        let (_, params) = tree.search("/p/rust/intro").unwrap();
        assert_eq!(params["lang"], "rust");
        assert_eq!(params["page"], "intro");
    }
}
