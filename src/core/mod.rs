//! The execution and composition model.
//!
//! - [`logic`]: the hook contract shared by nodes and AddOns
//! - [`template`] and [`asset`]: design-time class descriptions
//! - [`runtime`]: graph instances, signal propagation, save/load
//! - [`accept`]: the AddOn acceptance protocol

pub mod accept;
pub mod arena;
pub mod asset;
pub mod context;
pub mod diagnostics;
pub mod logic;
pub mod owner;
pub mod pin;
pub mod runtime;
pub mod template;
pub mod types;

use std::any::Any;

/// The Alias for serde_json::Value, used for opaque node state in save records
pub type NodeValue = serde_json::Value;

/// Stable node identity, assigned at authoring time.
pub type NodeGuid = uuid::Uuid;

/// A helper trait that just provides the `as_any` methods.
/// Needed for downcasting node/AddOn logic and flow owners to their concrete types.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
