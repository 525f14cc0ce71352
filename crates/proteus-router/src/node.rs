//! Radix tree node implementation.
//!
//! The core compressed-trie structure behind [`crate::Router`]. Insertion
//! is fallible: duplicate (method, path) registrations and misplaced
//! wildcards are reported instead of silently resolved.

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::InsertError;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named parameter (e.g., "{id}", "{userId}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
///
/// Each node represents a path segment and may have children for
/// sub-paths. Nodes at route boundaries carry a [`MethodRouter`].
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Method table for this node (if it's a route endpoint)
    pub methods: Option<MethodRouter<T>>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node<T>>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node<T>>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            kind: SegmentKind::Static,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            segment: format!("{{{name}}}"),
            kind: SegmentKind::Param(name),
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            segment: format!("*{name}"),
            kind: SegmentKind::Wildcard(name),
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a route into the tree.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError::Conflict`] when a method on `path` is already
    /// bound, and [`InsertError::WildcardPosition`] when a wildcard segment
    /// is not the last segment of the pattern.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), InsertError> {
        let segments = Self::parse_path(path);
        self.insert_segments(&segments, methods, path)
    }

    /// Parses a path into segments.
    fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    (s.to_string(), SegmentKind::Param(name.to_string()))
                } else if let Some(name) = s.strip_prefix('*') {
                    (s.to_string(), SegmentKind::Wildcard(name.to_string()))
                } else {
                    (s.to_string(), SegmentKind::Static)
                }
            })
            .collect()
    }

    /// Inserts segments into the tree recursively.
    fn insert_segments(
        &mut self,
        segments: &[(String, SegmentKind)],
        methods: MethodRouter<T>,
        path: &str,
    ) -> Result<(), InsertError> {
        if segments.is_empty() {
            return Self::bind_methods(&mut self.methods, methods, path);
        }

        let (segment, kind) = &segments[0];
        let remaining = &segments[1..];

        match kind {
            SegmentKind::Static => {
                if let Some(child) = self
                    .static_children
                    .iter_mut()
                    .find(|c| c.segment == *segment)
                {
                    child.insert_segments(remaining, methods, path)
                } else {
                    let mut child = Node::new_static(segment);
                    child.insert_segments(remaining, methods, path)?;
                    self.static_children.push(child);
                    // Keep sorted for binary search
                    self.static_children
                        .sort_by(|a, b| a.segment.cmp(&b.segment));
                    Ok(())
                }
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new_param(name.clone())));
                child.insert_segments(remaining, methods, path)
            }
            SegmentKind::Wildcard(name) => {
                if !remaining.is_empty() {
                    return Err(InsertError::WildcardPosition {
                        path: path.to_string(),
                    });
                }
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new_wildcard(name.clone())));
                Self::bind_methods(&mut child.methods, methods, path)
            }
        }
    }

    /// Merges a method table into a route boundary, rejecting duplicates.
    fn bind_methods(
        slot: &mut Option<MethodRouter<T>>,
        methods: MethodRouter<T>,
        path: &str,
    ) -> Result<(), InsertError> {
        match slot {
            Some(existing) => existing
                .try_merge(methods)
                .map_err(|method| InsertError::Conflict {
                    method,
                    path: path.to_string(),
                }),
            None => {
                *slot = Some(methods);
                Ok(())
            }
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the method table and extracted parameters if found.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        self.match_segments(&segments, &mut params)
    }

    /// Matches segments against the tree recursively.
    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<(&'a MethodRouter<T>, Params)> {
        if segments.is_empty() {
            return self.methods.as_ref().map(|m| (m, params.clone()));
        }

        let segment = segments[0];
        let remaining = &segments[1..];

        // Static match has highest priority
        if let Some(child) = self.find_static_child(segment) {
            if let Some(result) = child.match_segments(remaining, params) {
                return Some(result);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let checkpoint = params.len();
                params.push(name.clone(), segment.to_string());
                if let Some(result) = child.match_segments(remaining, params) {
                    return Some(result);
                }
                // Drop the capture before falling through to the wildcard.
                params.truncate(checkpoint);
            }
        }

        // Wildcard catches all remaining segments
        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                let remaining_path = segments.join("/");
                params.push(name.clone(), remaining_path);
                return child.methods.as_ref().map(|m| (m, params.clone()));
            }
        }

        None
    }

    /// Finds a static child by segment using binary search.
    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_node_constructors() {
        let node: Node<&str> = Node::new_static("users");
        assert_eq!(node.segment, "users");
        assert_eq!(node.kind, SegmentKind::Static);

        let node: Node<&str> = Node::new_param("id");
        assert_eq!(node.segment, "{id}");
        assert_eq!(node.kind, SegmentKind::Param("id".to_string()));

        let node: Node<&str> = Node::new_wildcard("path");
        assert_eq!(node.segment, "*path");
        assert_eq!(node.kind, SegmentKind::Wildcard("path".to_string()));
    }

    #[test]
    fn test_insert_and_match_static() {
        let mut root = Node::root();
        root.insert("/users", MethodRouter::new().get("listUsers"))
            .unwrap();

        let (methods, params) = root.match_path("/users").unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"listUsers"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_insert_and_match_param() {
        let mut root = Node::root();
        root.insert("/users/{id}", MethodRouter::new().get("getUser"))
            .unwrap();

        let (methods, params) = root.match_path("/users/123").unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"getUser"));
        assert_eq!(params.get("id"), Some("123"));
    }

    #[test]
    fn test_insert_and_match_wildcard() {
        let mut root = Node::root();
        root.insert("/files/*path", MethodRouter::new().get("serveFile"))
            .unwrap();

        let (methods, params) = root.match_path("/files/images/logo.png").unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"serveFile"));
        assert_eq!(params.get("path"), Some("images/logo.png"));
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        root.insert("/users/me", MethodRouter::new().get("getCurrentUser"))
            .unwrap();
        root.insert("/users/{id}", MethodRouter::new().get("getUser"))
            .unwrap();

        let (methods, _) = root.match_path("/users/me").unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"getCurrentUser"));

        let (methods, params) = root.match_path("/users/123").unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"getUser"));
        assert_eq!(params.get("id"), Some("123"));
    }

    #[test]
    fn test_duplicate_method_is_conflict() {
        let mut root = Node::root();
        root.insert("/users", MethodRouter::new().get("listUsers"))
            .unwrap();

        let err = root
            .insert("/users", MethodRouter::new().get("listUsersAgain"))
            .unwrap_err();
        assert_eq!(
            err,
            InsertError::Conflict {
                method: Method::GET,
                path: "/users".to_string(),
            }
        );
    }

    #[test]
    fn test_disjoint_methods_share_a_path() {
        let mut root = Node::root();
        root.insert("/users", MethodRouter::new().get("listUsers"))
            .unwrap();
        root.insert("/users", MethodRouter::new().post("createUser"))
            .unwrap();

        let (methods, _) = root.match_path("/users").unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"listUsers"));
        assert_eq!(methods.endpoint(&Method::POST), Some(&"createUser"));
    }

    #[test]
    fn test_wildcard_must_be_last() {
        let mut root = Node::root();
        let err = root
            .insert("/files/*path/extra", MethodRouter::new().get("nope"))
            .unwrap_err();
        assert_eq!(
            err,
            InsertError::WildcardPosition {
                path: "/files/*path/extra".to_string(),
            }
        );
    }

    #[test]
    fn test_wildcard_after_param_backtrack_has_no_stale_params() {
        let mut root = Node::root();
        root.insert("/files/{name}/meta", MethodRouter::new().get("fileMeta"))
            .unwrap();
        root.insert("/files/*rest", MethodRouter::new().get("serveFile"))
            .unwrap();

        // The param branch captures name=abc, fails on the trailing
        // segment, and must not leak that capture into the wildcard match.
        let (methods, params) = root.match_path("/files/abc/data").unwrap();
        assert_eq!(methods.endpoint(&Method::GET), Some(&"serveFile"));
        assert_eq!(params.get("rest"), Some("abc/data"));
        assert_eq!(params.get("name"), None);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_multiple_params() {
        let mut root = Node::root();
        root.insert(
            "/orgs/{orgId}/users/{userId}",
            MethodRouter::new().get("getOrgUser"),
        )
        .unwrap();

        let (_, params) = root.match_path("/orgs/acme/users/123").unwrap();
        assert_eq!(params.get("orgId"), Some("acme"));
        assert_eq!(params.get("userId"), Some("123"));
    }

    #[test]
    fn test_no_match() {
        let mut root = Node::root();
        root.insert("/users", MethodRouter::new().get("listUsers"))
            .unwrap();

        assert!(root.match_path("/posts").is_none());
    }
}
