//! Dynamic Kubernetes resource object model
//!
//! Shared types for the kapply reconciliation engine. Resources are
//! modeled dynamically (typed corners plus arbitrary nested documents)
//! so the engine handles built-in and custom kinds uniformly.
//!
//! # Example
//!
//! ```
//! use resource_model::ResourceObject;
//!
//! let obj: ResourceObject = serde_json::from_value(serde_json::json!({
//!     "apiVersion": "v1",
//!     "kind": "ConfigMap",
//!     "metadata": { "name": "app-config", "namespace": "default" },
//!     "data": { "key": "value" }
//! })).unwrap();
//!
//! assert_eq!(obj.object_ref().to_string(), "v1/ConfigMap default/app-config");
//! ```

pub mod condition;
pub mod hash;
pub mod object;

pub use condition::{Condition, ConditionStatus};
pub use hash::append_hash;
pub use object::{ObjectRef, ResourceObject};
