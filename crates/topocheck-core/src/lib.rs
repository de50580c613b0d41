//! Topology verification engine for end-to-end tests.
//!
//! A test declares the topology it expects to observe (nodes and the calls
//! between them) in a TOML template. Each field of the template is a pattern:
//! a literal, a regex, a `${variable}` reference, a composite template such as
//! `${project}-pid:${pid}@${host}`, or a comparison rule.
//!
//! ## Layering
//!
//! - `config/` owns the template schema (strict serde + `Validate`).
//! - `pattern/` compiles and evaluates single field patterns.
//! - `binding` holds the per-pass variable bindings.
//! - `matcher/` pairs expected entities with actual ones and drives a pass.
//! - `diagnostics` defines the failures a pass can raise.
//!
//! The default flow is: template → `TopoMatcher` → `verify(actual)`.
//!
//! ```
//! use topocheck_core::{ActualTopology, TopoMatcher};
//!
//! let matcher = TopoMatcher::from_toml(r#"
//!     [[nodes]]
//!     id = "1"
//!     name = "User"
//! "#).unwrap();
//!
//! let actual = ActualTopology::from_json(r#"{
//!     "nodes": [{ "id": "1", "name": "User", "type": "USER", "isReal": false }],
//!     "calls": []
//! }"#).unwrap();
//!
//! matcher.verify(&actual).unwrap();
//! ```

pub mod binding;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod log;
pub mod matcher;
pub mod model;
pub mod pattern;

pub use binding::{Binding, BindingConflict, BindingContext, VariableScopes};
pub use diagnostics::{EntityKind, FailureKind, Field, VerifyError};
pub use error::Error;
pub use matcher::{CallMatcher, MatchResult, NodeMatcher, TopoMatcher, Verified};
pub use model::{
    ActualCall, ActualNode, ActualTopology, ExpectedCall, ExpectedNode, ExpectedTopology,
    SnapshotError,
};
pub use pattern::{PatternError, PatternFault, PatternValue};

pub(crate) use thiserror::Error as ThisError;

///
/// Crate Version
///

pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
