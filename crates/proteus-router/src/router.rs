//! High-level router API.
//!
//! [`Router`] is the primary interface for building and matching routes.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::{InsertError, RouteMatch};

/// A radix tree router generic over the endpoint payload.
///
/// Routes are matched in O(k) time where k is the length of the path.
/// Trailing slashes are normalized away during both insertion and matching.
///
/// # Example
///
/// ```
/// use proteus_router::{Router, MethodRouter};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/users", MethodRouter::new().get("listUsers")).unwrap();
///
/// let matched = router.match_route(&Method::GET, "/users/").unwrap();
/// assert_eq!(*matched.endpoint, "listUsers");
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, static segments win over parameter
/// segments, which win over wildcards.
#[derive(Debug, Clone)]
pub struct Router<T> {
    /// Root node of the radix tree
    root: Node<T>,
    /// Number of routes registered
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a route into the router.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError::Conflict`] if any method in `methods` is
    /// already bound on `path`, and [`InsertError::WildcardPosition`] for
    /// a wildcard that is not the final segment.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), InsertError> {
        self.root.insert(path, methods)?;
        self.route_count += 1;
        Ok(())
    }

    /// Convenience method to add a single-method route.
    ///
    /// # Errors
    ///
    /// Same as [`Router::insert`].
    pub fn route(&mut self, method: &Method, path: &str, endpoint: T) -> Result<(), InsertError> {
        let methods = MethodRouter::new().method(method, endpoint);
        self.insert(path, methods)
    }

    /// Matches a path and method against the router.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (methods, params) = self.root.match_path(path)?;
        let endpoint = methods.endpoint(method)?;
        Some(RouteMatch::new(endpoint, params))
    }

    /// Matches a path against the router (without method).
    ///
    /// Useful for checking allowed methods or generating 405 responses.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_new_is_empty() {
        let router: Router<&str> = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_router_insert_and_match() {
        let mut router = Router::new();
        router
            .insert("/users", MethodRouter::new().get("listUsers"))
            .unwrap();
        assert_eq!(router.len(), 1);

        let matched = router.match_route(&Method::GET, "/users").unwrap();
        assert_eq!(*matched.endpoint, "listUsers");
    }

    #[test]
    fn test_router_match_param() {
        let mut router = Router::new();
        router
            .insert("/users/{id}", MethodRouter::new().get("getUser"))
            .unwrap();

        let matched = router.match_route(&Method::GET, "/users/123").unwrap();
        assert_eq!(*matched.endpoint, "getUser");
        assert_eq!(matched.params.get("id"), Some("123"));
    }

    #[test]
    fn test_router_method_not_allowed() {
        let mut router = Router::new();
        router
            .insert("/users", MethodRouter::new().get("listUsers"))
            .unwrap();

        // Path matches but method doesn't
        assert!(router.match_route(&Method::POST, "/users").is_none());
        assert!(router.match_path("/users").is_some());
    }

    #[test]
    fn test_router_duplicate_route_rejected() {
        let mut router = Router::new();
        router
            .route(&Method::GET, "/health", "healthCheck")
            .unwrap();

        let err = router
            .route(&Method::GET, "/health", "healthCheckAgain")
            .unwrap_err();
        assert!(matches!(err, InsertError::Conflict { .. }));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_router_trailing_slash_normalized() {
        let mut router = Router::new();
        router
            .insert("/users", MethodRouter::new().get("listUsers"))
            .unwrap();

        let matched = router.match_route(&Method::GET, "/users/").unwrap();
        assert_eq!(*matched.endpoint, "listUsers");
    }

    #[test]
    fn test_router_root_path() {
        let mut router = Router::new();
        router.insert("/", MethodRouter::new().get("root")).unwrap();

        let matched = router.match_route(&Method::GET, "/").unwrap();
        assert_eq!(*matched.endpoint, "root");
    }

    #[test]
    fn test_router_complex_paths() {
        let mut router = Router::new();
        router
            .insert("/api/v1/users", MethodRouter::new().get("listUsers"))
            .unwrap();
        router
            .insert(
                "/api/v1/users/{userId}/posts/{postId}",
                MethodRouter::new().get("getUserPost"),
            )
            .unwrap();

        let matched = router
            .match_route(&Method::GET, "/api/v1/users/123/posts/456")
            .unwrap();
        assert_eq!(*matched.endpoint, "getUserPost");
        assert_eq!(matched.params.get("userId"), Some("123"));
        assert_eq!(matched.params.get("postId"), Some("456"));
    }
}
