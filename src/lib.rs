//! Baton - a user-configurable macro execution engine.
//!
//! A macro is a named, ordered sequence of actions: host command
//! references, structured command invocations, shell snippets, or embedded
//! scripts. Before an action is dispatched, its injections can compute
//! dynamic values and splice them into the action's arguments.
//!
//! The engine never talks to an editor, terminal, or filesystem surface
//! directly; everything outward goes through the traits in [`host`], so the
//! same core drives a real host, the bundled CLI, and the test suite.

pub mod engine;
pub mod error;
pub mod host;

pub use error::{BatonError, Result};
