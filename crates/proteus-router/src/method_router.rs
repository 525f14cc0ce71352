//! Per-path HTTP method table.
//!
//! A [`MethodRouter`] maps HTTP methods to endpoints for a single path.
//! Merging two method routers for the same path fails if any method is
//! bound on both sides; duplicate registration is rejected rather than
//! silently resolved.

use http::Method;

/// Maps HTTP methods to endpoints for a single route.
///
/// # Example
///
/// ```
/// use proteus_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new().get("listUsers").post("createUser");
///
/// assert_eq!(router.endpoint(&Method::GET), Some(&"listUsers"));
/// assert_eq!(router.endpoint(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    get: Option<T>,
    post: Option<T>,
    put: Option<T>,
    delete: Option<T>,
    patch: Option<T>,
    head: Option<T>,
    options: Option<T>,
    // CONNECT, TRACE, and extension methods.
    other: Vec<(Method, T)>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            head: None,
            options: None,
            other: Vec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET endpoint.
    #[must_use]
    pub fn get(mut self, endpoint: T) -> Self {
        self.get = Some(endpoint);
        self
    }

    /// Registers a POST endpoint.
    #[must_use]
    pub fn post(mut self, endpoint: T) -> Self {
        self.post = Some(endpoint);
        self
    }

    /// Registers a PUT endpoint.
    #[must_use]
    pub fn put(mut self, endpoint: T) -> Self {
        self.put = Some(endpoint);
        self
    }

    /// Registers a DELETE endpoint.
    #[must_use]
    pub fn delete(mut self, endpoint: T) -> Self {
        self.delete = Some(endpoint);
        self
    }

    /// Registers a PATCH endpoint.
    #[must_use]
    pub fn patch(mut self, endpoint: T) -> Self {
        self.patch = Some(endpoint);
        self
    }

    /// Registers a HEAD endpoint.
    #[must_use]
    pub fn head(mut self, endpoint: T) -> Self {
        self.head = Some(endpoint);
        self
    }

    /// Registers an OPTIONS endpoint.
    #[must_use]
    pub fn options(mut self, endpoint: T) -> Self {
        self.options = Some(endpoint);
        self
    }

    /// Registers an endpoint for a specific method.
    ///
    /// CONNECT, TRACE, and extension methods are stored alongside the
    /// common set; registering a method twice replaces the endpoint.
    #[must_use]
    pub fn method(mut self, method: &Method, endpoint: T) -> Self {
        match *method {
            Method::GET => self.get = Some(endpoint),
            Method::POST => self.post = Some(endpoint),
            Method::PUT => self.put = Some(endpoint),
            Method::DELETE => self.delete = Some(endpoint),
            Method::PATCH => self.patch = Some(endpoint),
            Method::HEAD => self.head = Some(endpoint),
            Method::OPTIONS => self.options = Some(endpoint),
            _ => {
                if let Some(slot) = self.other.iter_mut().find(|(m, _)| m == method) {
                    slot.1 = endpoint;
                } else {
                    self.other.push((method.clone(), endpoint));
                }
            }
        }
        self
    }

    /// Returns the endpoint for a given HTTP method.
    #[must_use]
    pub fn endpoint(&self, method: &Method) -> Option<&T> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            _ => self
                .other
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, endpoint)| endpoint),
        }
    }

    /// Merges another method router into this one.
    ///
    /// Fails with the first conflicting method if both routers bind it;
    /// on failure `self` may have absorbed some of `other`'s methods.
    pub fn try_merge(&mut self, other: Self) -> Result<(), Method> {
        Self::merge_slot(&mut self.get, other.get, Method::GET)?;
        Self::merge_slot(&mut self.post, other.post, Method::POST)?;
        Self::merge_slot(&mut self.put, other.put, Method::PUT)?;
        Self::merge_slot(&mut self.delete, other.delete, Method::DELETE)?;
        Self::merge_slot(&mut self.patch, other.patch, Method::PATCH)?;
        Self::merge_slot(&mut self.head, other.head, Method::HEAD)?;
        Self::merge_slot(&mut self.options, other.options, Method::OPTIONS)?;
        for (method, endpoint) in other.other {
            if self.other.iter().any(|(m, _)| *m == method) {
                return Err(method);
            }
            self.other.push((method, endpoint));
        }
        Ok(())
    }

    fn merge_slot(dst: &mut Option<T>, src: Option<T>, method: Method) -> Result<(), Method> {
        match (dst.is_some(), src) {
            (_, None) => Ok(()),
            (false, Some(endpoint)) => {
                *dst = Some(endpoint);
                Ok(())
            }
            (true, Some(_)) => Err(method),
        }
    }

    /// Returns true if any methods are registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        self.get.is_some()
            || self.post.is_some()
            || self.put.is_some()
            || self.delete.is_some()
            || self.patch.is_some()
            || self.head.is_some()
            || self.options.is_some()
            || !self.other.is_empty()
    }

    /// Returns a list of methods registered on this route.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods = Vec::with_capacity(7);
        if self.get.is_some() {
            methods.push(Method::GET);
        }
        if self.post.is_some() {
            methods.push(Method::POST);
        }
        if self.put.is_some() {
            methods.push(Method::PUT);
        }
        if self.delete.is_some() {
            methods.push(Method::DELETE);
        }
        if self.patch.is_some() {
            methods.push(Method::PATCH);
        }
        if self.head.is_some() {
            methods.push(Method::HEAD);
        }
        if self.options.is_some() {
            methods.push(Method::OPTIONS);
        }
        methods.extend(self.other.iter().map(|(m, _)| m.clone()));
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_router_new_has_no_methods() {
        let router: MethodRouter<&str> = MethodRouter::new();
        assert!(!router.has_any_method());
    }

    #[test]
    fn test_method_router_get() {
        let router = MethodRouter::new().get("listUsers");
        assert_eq!(router.endpoint(&Method::GET), Some(&"listUsers"));
        assert_eq!(router.endpoint(&Method::POST), None);
    }

    #[test]
    fn test_method_router_multiple() {
        let router = MethodRouter::new()
            .get("getUser")
            .post("createUser")
            .put("updateUser")
            .delete("deleteUser");

        assert_eq!(router.endpoint(&Method::GET), Some(&"getUser"));
        assert_eq!(router.endpoint(&Method::POST), Some(&"createUser"));
        assert_eq!(router.endpoint(&Method::PUT), Some(&"updateUser"));
        assert_eq!(router.endpoint(&Method::DELETE), Some(&"deleteUser"));
    }

    #[test]
    fn test_method_router_generic_method() {
        let router = MethodRouter::new().method(&Method::PATCH, "patchUser");
        assert_eq!(router.endpoint(&Method::PATCH), Some(&"patchUser"));
    }

    #[test]
    fn test_method_router_extension_method() {
        let subscribe = Method::from_bytes(b"SUBSCRIBE").unwrap();
        let router = MethodRouter::new().method(&subscribe, "subscribe");

        assert_eq!(router.endpoint(&subscribe), Some(&"subscribe"));
        assert!(router.has_any_method());
        assert!(router.allowed_methods().contains(&subscribe));
    }

    #[test]
    fn test_method_router_extension_method_replaces_on_rebind() {
        let subscribe = Method::from_bytes(b"SUBSCRIBE").unwrap();
        let router = MethodRouter::new()
            .method(&subscribe, "first")
            .method(&subscribe, "second");

        assert_eq!(router.endpoint(&subscribe), Some(&"second"));
        assert_eq!(router.allowed_methods().len(), 1);
    }

    #[test]
    fn test_method_router_try_merge_extension_conflict() {
        let subscribe = Method::from_bytes(b"SUBSCRIBE").unwrap();
        let mut router = MethodRouter::new().method(&subscribe, "original");
        let result = router.try_merge(MethodRouter::new().method(&subscribe, "duplicate"));

        assert_eq!(result, Err(subscribe.clone()));
        assert_eq!(router.endpoint(&subscribe), Some(&"original"));
    }

    #[test]
    fn test_method_router_try_merge_disjoint() {
        let mut router = MethodRouter::new().get("getUsers");
        router
            .try_merge(MethodRouter::new().post("createUser"))
            .unwrap();

        assert_eq!(router.endpoint(&Method::GET), Some(&"getUsers"));
        assert_eq!(router.endpoint(&Method::POST), Some(&"createUser"));
    }

    #[test]
    fn test_method_router_try_merge_conflict() {
        let mut router = MethodRouter::new().get("original");
        let result = router.try_merge(MethodRouter::new().get("duplicate"));

        assert_eq!(result, Err(Method::GET));
        // The original binding survives a rejected merge.
        assert_eq!(router.endpoint(&Method::GET), Some(&"original"));
    }

    #[test]
    fn test_method_router_allowed_methods() {
        let router = MethodRouter::new().get("get").post("post").delete("delete");

        let allowed = router.allowed_methods();
        assert!(allowed.contains(&Method::GET));
        assert!(allowed.contains(&Method::POST));
        assert!(allowed.contains(&Method::DELETE));
        assert!(!allowed.contains(&Method::PUT));
    }
}
