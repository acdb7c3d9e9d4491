//! Accessibility snapshot engine
//!
//! Turns a host document into a compact, YAML-like accessibility tree for
//! LLM consumption and hands out short refs (`e1`, `e2`, …) that resolve back
//! to elements until the next snapshot.
//!
//! ## Core Design
//!
//! ```text
//! CDP JSON → DomArena (owned) → TreeBuilder → AriaSnapshot → serializer → text
//!                ↑                    ↓
//!             NodeId (u32)      RefRegistry (ref → element)
//! ```
//!
//! Role, name and state computation live in `roles`, the walk in
//! `aria_tree`, rendering in `serializer`. `DomService` wires them to CDP
//! responses; `SnapshotSession` is the host-agnostic entry point.

pub mod arena;
pub mod aria_tree;
pub mod cache;
pub mod dom_utils;
pub mod error;
pub mod refs;
pub mod roles;
pub mod serializer;
pub mod service;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;

pub use arena::DomArena;
pub use aria_tree::{AriaChild, AriaNode, AriaSnapshot, AriaTreeOptions, RefPolicy, Visibility};
pub use error::{DomError, Result};
pub use refs::{RefEntry, RefRegistry};
pub use roles::AriaTristate;
pub use serializer::{RenderOptions, SnapshotFormat, SnapshotItem, SnapshotOutput};
pub use service::{DomService, DomServiceConfig};
pub use session::SnapshotSession;
pub use types::*;
