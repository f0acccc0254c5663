//! Radix trie router
//!
//! Uses matchit for efficient path matching with support for:
//! - Static paths: /login
//! - Dynamic segments: /users/{id}
//! - Wildcards: /files/{*path}
//!
//! The router is an explicit object owned by the server; routes are
//! registered against it directly, never through process-wide state.

use crate::{Error, Method, Result};
use std::collections::HashMap;

/// Route match result
#[derive(Debug, Clone)]
pub struct RouteMatch<T> {
    /// The matched handler/value
    pub value: T,
    /// Captured path parameters
    pub params: HashMap<String, String>,
}

/// Per-method router using matchit
struct MethodRouter<T> {
    router: matchit::Router<T>,
}

impl<T: Clone> MethodRouter<T> {
    fn new() -> Self {
        Self {
            router: matchit::Router::new(),
        }
    }

    fn insert(&mut self, path: &str, value: T) -> Result<()> {
        self.router
            .insert(path, value)
            .map_err(|e| Error::InvalidPath(e.to_string()))
    }

    fn at(&self, path: &str) -> Option<RouteMatch<T>> {
        self.router.at(path).ok().map(|matched| {
            let params = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            RouteMatch {
                value: matched.value.clone(),
                params,
            }
        })
    }
}

/// HTTP router
///
/// Routes are organized by HTTP method for O(1) method dispatch,
/// then matched using a radix trie for efficient path matching.
pub struct Router<T> {
    get: MethodRouter<T>,
    post: MethodRouter<T>,
    put: MethodRouter<T>,
    delete: MethodRouter<T>,
    patch: MethodRouter<T>,
    head: MethodRouter<T>,
    options: MethodRouter<T>,
}

impl<T: Clone> Router<T> {
    /// Create a new router
    pub fn new() -> Self {
        Self {
            get: MethodRouter::new(),
            post: MethodRouter::new(),
            put: MethodRouter::new(),
            delete: MethodRouter::new(),
            patch: MethodRouter::new(),
            head: MethodRouter::new(),
            options: MethodRouter::new(),
        }
    }

    /// Add a route
    pub fn route(&mut self, method: Method, path: &str, value: T) -> Result<()> {
        match method {
            Method::Get => self.get.insert(path, value),
            Method::Post => self.post.insert(path, value),
            Method::Put => self.put.insert(path, value),
            Method::Delete => self.delete.insert(path, value),
            Method::Patch => self.patch.insert(path, value),
            Method::Head => self.head.insert(path, value),
            Method::Options => self.options.insert(path, value),
        }
    }

    /// Add a GET route
    pub fn get(&mut self, path: &str, value: T) -> Result<()> {
        self.route(Method::Get, path, value)
    }

    /// Add a POST route
    pub fn post(&mut self, path: &str, value: T) -> Result<()> {
        self.route(Method::Post, path, value)
    }

    /// Match a request
    pub fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch<T>> {
        match method {
            Method::Get => self.get.at(path),
            Method::Post => self.post.at(path),
            Method::Put => self.put.at(path),
            Method::Delete => self.delete.at(path),
            Method::Patch => self.patch.at(path),
            Method::Head => self.head.at(path).or_else(|| self.get.at(path)),
            Method::Options => self.options.at(path),
        }
    }
}

impl<T: Clone> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}
