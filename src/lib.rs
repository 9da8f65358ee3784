//! # pdag-rs: Indexed Boolean Graphs for Fault Trees
//!
//! **`pdag-rs`** is a safe, manager-centric library for **Propositional
//! Directed Acyclic Graphs (PDAGs)**: the indexed Boolean-circuit
//! representation of fault trees used by probabilistic risk analyses.
//!
//! ## What is a PDAG?
//!
//! A PDAG replaces the names and pointers of a symbolic fault tree with
//! small integer indices: the constant TRUE is node 1, the variables (basic
//! events) occupy a dense range starting at 2, and gates take the indices
//! after that. Every edge carries a sign, so the complement of a node never
//! needs a node of its own. Preprocessing algorithms rewrite the graph in
//! place --- coalescing gates, propagating constants, splicing pass-through
//! gates --- while every rewrite preserves Boolean equivalence.
//!
//! ## Key Features
//!
//! - **Graph-Centric Architecture**: All nodes belong to a [`Pdag`][crate::pdag::Pdag]
//!   that issues indices, owns the single constant, and tracks gates that
//!   degenerate during rewrites.
//! - **Signed References**: Lightweight [`Ref`][crate::reference::Ref]
//!   values encode a node index and a complement bit, keeping the
//!   signed-argument algebra explicit.
//! - **Local Rewrites**: Adding a duplicate or complement argument folds
//!   the gate according to its Boolean logic --- including the K/N
//!   decompositions --- without touching the rest of the graph.
//! - **Traversal Scaffolding**: Per-node visit times, orders, counts, and
//!   optimization values support linear-time passes, with reset sweeps on
//!   the graph.
//!
//! ## Basic Usage
//!
//! ```rust
//! use pdag_rs::model::{BasicEvent, Formula, Gate};
//! use pdag_rs::{Operator, Pdag, PdagConfig};
//!
//! // 1. Describe the fault tree symbolically.
//! let motor = BasicEvent::new("Motor", 0.1);
//! let valve = BasicEvent::new("Valve", 0.05);
//! let top = Gate::new(
//!     "Top",
//!     Formula::new(Operator::Or, vec![motor.into(), valve.into()]),
//! );
//!
//! // 2. Build the indexed graph.
//! let graph = Pdag::from_fault_tree(&top, PdagConfig::default()).unwrap();
//!
//! // 3. Inspect it through indices.
//! let root = graph.root().unwrap();
//! assert_eq!(root.borrow().operator(), Operator::Or);
//! assert_eq!(graph.num_variables(), 2);
//! assert_eq!(graph.basic_event(2).name(), "Motor");
//! ```
//!
//! ## Core Components
//!
//! - **[`pdag`]**: The graph manager: construction from a fault-tree model,
//!   index issuance, rewrite worklists, and traversal-mark lifecycle.
//! - **[`gate`]**: The gate node and the editing API with its Boolean
//!   rewrites.
//! - **[`model`]**: The symbolic fault-tree source consumed by
//!   construction.
//! - **[`print`]**: Aralia-like diagnostic output.

pub mod error;
pub mod gate;
pub mod linear_map;
pub mod model;
pub mod node;
pub mod pdag;
pub mod print;
pub mod reference;

pub use error::{Error, Result};
pub use gate::{Gate, Operator, State};
pub use node::{ConstantRef, GateRef, GateWeak, NodeRef, VariableRef};
pub use pdag::{Pdag, PdagConfig};
pub use reference::Ref;
