//! Fixed-point saturation
//!
//! Drives the semi-naive fixed point over the annotated program, one
//! stratum at a time. Within a stratum, work items are batches of newly
//! derived facts: each fact is matched against the annotated clauses keyed
//! by its predicate, and accepted derivations (first past the redundancy
//! trie) are indexed and batched into successor work items.
//!
//! The concurrent strategy runs the items on a dedicated work-stealing pool;
//! `scope` holds the driver until the pending-work count reaches zero, which
//! is also the happens-before edge between strata. The serial strategy runs
//! the identical protocol on a local worklist.

use crate::annotate::{annotate_program, StratumPlan};
use crate::error::EvalError;
use crate::evaluator::ClauseEvaluator;
use datalog_ast::Atom;
use datalog_index::{FactIndexer, RedundancyTrie};
use datalog_validate::ValidProgram;
use rayon::Scope;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Default work-item size for the chunked engine.
pub const DEFAULT_CHUNK_SIZE: usize = 32;

/// How the fixed point is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Single-threaded worklist.
    Serial,
    /// Work-stealing pool; `chunk_size = 1` submits every fact on its own.
    Concurrent {
        workers: Option<usize>,
        chunk_size: usize,
    },
}

pub struct Saturator {
    strategy: Strategy,
}

impl Saturator {
    pub fn new(strategy: Strategy) -> Self {
        Saturator { strategy }
    }

    pub fn serial() -> Self {
        Saturator::new(Strategy::Serial)
    }

    /// One work item per derived fact.
    pub fn concurrent() -> Self {
        Saturator::new(Strategy::Concurrent {
            workers: None,
            chunk_size: 1,
        })
    }

    pub fn chunked(chunk_size: usize) -> Self {
        Saturator::new(Strategy::Concurrent {
            workers: None,
            chunk_size: chunk_size.max(1),
        })
    }

    /// Saturate the program and return the filled indexer.
    pub fn saturate(&self, program: &ValidProgram) -> Result<FactIndexer, EvalError> {
        let plans = annotate_program(program);
        let index = FactIndexer::new();
        let trie = RedundancyTrie::new();

        for fact in program.initial_facts() {
            if trie.add(fact) {
                index.add(fact);
            }
        }

        match self.strategy {
            Strategy::Serial => {
                for (stratum, plan) in plans.iter().enumerate() {
                    trace!(stratum, "running stratum");
                    run_stratum_serial(plan, &index, &trie);
                }
            }
            Strategy::Concurrent {
                workers,
                chunk_size,
            } => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(n) = workers {
                    builder = builder.num_threads(n);
                }
                let pool = builder
                    .build()
                    .map_err(|e| EvalError::ThreadPool(e.to_string()))?;
                for (stratum, plan) in plans.iter().enumerate() {
                    trace!(stratum, "running stratum");
                    run_stratum_concurrent(&pool, plan, &index, &trie, chunk_size);
                }
            }
        }

        debug!(facts = index.len(), "saturation complete");
        Ok(index)
    }
}

/// Run the stratum's one-shot clauses, then collect the seed facts: every
/// indexed fact whose predicate triggers one of the stratum's rules. Lower
/// strata are saturated by now, so negated-only one-shots see their final
/// extent, and their derivations join the seeds.
fn seed_stratum(plan: &StratumPlan, index: &FactIndexer, trie: &RedundancyTrie) -> Vec<Atom> {
    for clause in &plan.one_shots {
        ClauseEvaluator::new(clause, index).evaluate_one_shot(&mut |fact| {
            if trie.add(&fact) {
                index.add(&fact);
            }
        });
    }

    let mut seeds = Vec::new();
    for pred in &plan.delta_preds {
        seeds.extend(index.facts_of(*pred));
    }
    seeds
}

fn run_stratum_serial(plan: &StratumPlan, index: &FactIndexer, trie: &RedundancyTrie) {
    let mut queue: VecDeque<Atom> = seed_stratum(plan, index, trie).into();
    while let Some(fact) = queue.pop_front() {
        let Some(rules) = plan.rules_by_pred.get(&fact.pred) else {
            continue;
        };
        for rule in rules {
            ClauseEvaluator::new(rule, index).evaluate(&fact, &mut |derived| {
                if trie.add(&derived) {
                    index.add(&derived);
                    queue.push_back(derived);
                }
            });
        }
    }
}

/// Shared state of one stratum's parallel fixed point.
struct StratumCtx<'a> {
    plan: &'a StratumPlan,
    index: &'a FactIndexer,
    trie: &'a RedundancyTrie,
    chunk_size: usize,
}

fn run_stratum_concurrent(
    pool: &rayon::ThreadPool,
    plan: &StratumPlan,
    index: &FactIndexer,
    trie: &RedundancyTrie,
    chunk_size: usize,
) {
    let ctx = StratumCtx {
        plan,
        index,
        trie,
        chunk_size,
    };
    let seeds = seed_stratum(plan, index, trie);
    if seeds.is_empty() {
        return;
    }

    // The scope returns once every spawned work item (including items
    // spawned by other items) has completed: pending work has hit zero.
    pool.scope(|scope| {
        let ctx = &ctx;
        let mut chunk = Vec::with_capacity(ctx.chunk_size);
        for fact in seeds {
            chunk.push(fact);
            if chunk.len() >= ctx.chunk_size {
                let full = std::mem::replace(&mut chunk, Vec::with_capacity(ctx.chunk_size));
                scope.spawn(move |scope| process_chunk(scope, ctx, full));
            }
        }
        if !chunk.is_empty() {
            scope.spawn(move |scope| process_chunk(scope, ctx, chunk));
        }
    });
}

fn process_chunk<'s>(scope: &Scope<'s>, ctx: &'s StratumCtx<'s>, chunk: Vec<Atom>) {
    trace!(facts = chunk.len(), "processing work item");
    let mut acc: Vec<Atom> = Vec::new();
    for fact in &chunk {
        let Some(rules) = ctx.plan.rules_by_pred.get(&fact.pred) else {
            continue;
        };
        for rule in rules {
            ClauseEvaluator::new(rule, ctx.index).evaluate(fact, &mut |derived| {
                if ctx.trie.add(&derived) {
                    ctx.index.add(&derived);
                    acc.push(derived);
                    if acc.len() >= ctx.chunk_size {
                        let full = std::mem::take(&mut acc);
                        scope.spawn(move |scope| process_chunk(scope, ctx, full));
                    }
                }
            });
        }
    }
    if !acc.is_empty() {
        scope.spawn(move |scope| process_chunk(scope, ctx, acc));
    }
}
