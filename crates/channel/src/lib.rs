//! # Weft Channel
//!
//! The use-case layer: channel lifecycle (create/join), multi-organization
//! governance (add/delete organization), and program lifecycle (install,
//! instantiate, invoke, query). Each use case is a fixed sequence over the
//! protocol client: propose, endorse, assemble, broadcast, confirm for
//! state-changing operations; compute-delta, co-sign, broadcast for
//! governance.

pub mod channel;
pub mod manage;
pub mod org;
pub mod program;

pub use channel::Channel;
pub use org::OrgContext;
pub use program::Program;
