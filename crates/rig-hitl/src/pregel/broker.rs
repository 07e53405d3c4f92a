//! Request/response broker
//!
//! Tracks every pending request of a run by id so that answers arriving on a
//! later `resume` find their way back to the vertex that asked. Ids are
//! random v4 UUIDs and are never reused within a run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PregelError;
use super::vertex::VertexId;

/// Unique identifier of a pending request
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    /// Create a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A suspension point waiting for the external actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequest<R> {
    pub id: RequestId,
    /// Vertex that will receive the answer
    pub origin: VertexId,
    pub payload: R,
    pub created_at: DateTime<Utc>,
}

/// Registry of unresolved requests for one run
#[derive(Debug)]
pub struct RequestBroker<R> {
    pending: HashMap<RequestId, PendingRequest<R>>,
    /// Registration order, so callers see requests in the order they were made
    order: Vec<RequestId>,
    issued: usize,
}

impl<R> Default for RequestBroker<R> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
            order: Vec::new(),
            issued: 0,
        }
    }
}

impl<R: Clone> RequestBroker<R> {
    /// Create an empty broker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request and return its id
    pub fn register(&mut self, origin: VertexId, payload: R) -> RequestId {
        let mut id = RequestId::new();
        while self.pending.contains_key(&id) {
            id = RequestId::new();
        }
        self.pending.insert(
            id.clone(),
            PendingRequest {
                id: id.clone(),
                origin,
                payload,
                created_at: Utc::now(),
            },
        );
        self.order.push(id.clone());
        self.issued += 1;
        id
    }

    /// Remove and return a pending request
    ///
    /// Fails with `UnknownRequestId` if the id was never issued or has
    /// already been resolved.
    pub fn resolve(&mut self, id: &RequestId) -> Result<PendingRequest<R>, PregelError> {
        let request = self
            .pending
            .remove(id)
            .ok_or_else(|| PregelError::UnknownRequestId(id.clone()))?;
        self.order.retain(|existing| existing != id);
        Ok(request)
    }

    /// Look up a pending request without resolving it
    pub fn get(&self, id: &RequestId) -> Option<&PendingRequest<R>> {
        self.pending.get(id)
    }

    /// Check if a request is still pending
    pub fn contains(&self, id: &RequestId) -> bool {
        self.pending.contains_key(id)
    }

    /// Unresolved requests in registration order
    pub fn pending(&self) -> Vec<&PendingRequest<R>> {
        self.order
            .iter()
            .filter_map(|id| self.pending.get(id))
            .collect()
    }

    /// Number of unresolved requests
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total number of requests ever registered
    pub fn issued(&self) -> usize {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_register_and_resolve() {
        let mut broker = RequestBroker::new();
        let id = broker.register(VertexId::new("manager"), "approve?".to_string());

        assert_eq!(broker.len(), 1);
        assert!(broker.contains(&id));
        assert_eq!(broker.get(&id).unwrap().origin, VertexId::new("manager"));

        let request = broker.resolve(&id).unwrap();
        assert_eq!(request.payload, "approve?");
        assert!(broker.is_empty());
    }

    #[test]
    fn test_second_resolve_fails() {
        let mut broker = RequestBroker::new();
        let id = broker.register(VertexId::new("manager"), 1);

        assert!(broker.resolve(&id).is_ok());
        match broker.resolve(&id) {
            Err(PregelError::UnknownRequestId(missing)) => assert_eq!(missing, id),
            other => panic!("Expected UnknownRequestId, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_id_leaves_broker_intact() {
        let mut broker = RequestBroker::new();
        let id = broker.register(VertexId::new("a"), 1);

        assert!(broker.resolve(&RequestId::from("never-issued")).is_err());
        assert_eq!(broker.len(), 1);
        assert!(broker.contains(&id));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut broker = RequestBroker::new();
        let ids: HashSet<_> = (0..500)
            .map(|i| broker.register(VertexId::new("v"), i))
            .collect();
        assert_eq!(ids.len(), 500);
        assert_eq!(broker.issued(), 500);
    }

    #[test]
    fn test_pending_preserves_registration_order() {
        let mut broker = RequestBroker::new();
        let first = broker.register(VertexId::new("a"), "first");
        let second = broker.register(VertexId::new("b"), "second");
        let third = broker.register(VertexId::new("c"), "third");

        broker.resolve(&second).unwrap();

        let pending: Vec<_> = broker.pending().iter().map(|r| r.id.clone()).collect();
        assert_eq!(pending, vec![first, third]);
        assert_eq!(broker.issued(), 3);
    }
}
