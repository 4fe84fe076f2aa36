//! Cross-target bound compatibility traits
//!
//! Gateways are shared between tasks on native targets, so the gateway trait
//! requires `Send + Sync` there. On `wasm32` targets everything runs on one
//! thread and the same trait imposes no bound at all.

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<S> ConditionalSync for S where S: Send + Sync {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSync {}

#[cfg(target_arch = "wasm32")]
impl<S> ConditionalSync for S {}
