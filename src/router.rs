//! Route table: (method, pattern) pairs mapped to handlers.
//!
//! Each HTTP method owns an independent [`Trie`]; there is no
//! method-agnostic matching. The table is filled during the configuration
//! phase and only read afterwards, so resolution needs no locking.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::error::Error;
use crate::handler::HandlerFn;
use crate::trie::Trie;

pub(crate) struct RouteTable {
    trees: HashMap<Method, Trie>,
    handlers: HashMap<(Method, String), HandlerFn>,
}

impl RouteTable {
    pub(crate) fn new() -> Self {
        Self { trees: HashMap::new(), handlers: HashMap::new() }
    }

    /// Inserts `pattern` into the method's tree (created lazily) and
    /// records the handler. A conflicting pattern leaves the table
    /// untouched and reports the configuration error to the caller.
    pub(crate) fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerFn,
    ) -> Result<(), Error> {
        self.trees
            .entry(method.clone())
            .or_insert_with(Trie::new)
            .insert(pattern)?;
        self.handlers.insert((method.clone(), pattern.to_owned()), handler);
        debug!(%method, pattern, "route registered");
        Ok(())
    }

    /// Resolves a concrete request path to its handler and parameter map.
    ///
    /// `None` covers three cases uniformly: no tree for the method, no
    /// structural match, and (defensively) a matched pattern with no
    /// recorded handler.
    pub(crate) fn resolve(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(HandlerFn, HashMap<String, String>)> {
        let tree = self.trees.get(method)?;
        let (pattern, params) = tree.search(path)?;
        let handler = self.handlers.get(&(method.clone(), pattern.to_owned()))?;
        Some((Arc::clone(handler), params))
    }
}
