//! # RuneChain Test Suite
//!
//! Cross-subsystem scenarios driven through the full node: witness
//! consensus, the AMM, vault custody, the outbound pipeline, and the
//! reward engine working together. Per-subsystem unit tests live with
//! their crates; this crate owns everything that spans more than one.

pub mod harness;

pub use harness::TestNet;

#[cfg(test)]
mod scenarios;
