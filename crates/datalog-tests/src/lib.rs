//! End-to-end scenarios and property-based tests for the engines
//!
//! Programs are fed through the textual parser and evaluated on every
//! engine variant; property tests check that the variants agree on random
//! inputs.

#[cfg(test)]
mod equivalence;

#[cfg(test)]
mod scenarios;
