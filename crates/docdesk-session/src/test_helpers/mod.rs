//! Test helpers for session unit tests
//!
//! Provides an in-memory [`DocumentStore`](docdesk_api_client::DocumentStore)
//! so the state containers can be exercised without a running service.

pub mod mock_store;

pub use mock_store::MockStore;
