//! Magic-set query evaluation
//!
//! Rewrites a query-and-program pair into an equivalent program whose
//! bottom-up saturation only materializes atoms relevant to the query,
//! simulating a goal-directed strategy. The rewritten program is handed to
//! the concurrent saturator and the results are translated back to the
//! original vocabulary.
//!
//! Generated relations live under the reserved `%` name prefix, which the
//! validator forbids in source programs, so collisions are impossible.

pub mod adorn;
pub mod engine;
pub mod transform;

pub use adorn::{adorn_rule, AdornedAtom, AdornedPred, AdornedRule};
pub use engine::MagicSetEngine;
pub use transform::{magic_transform, MagicProgram};
