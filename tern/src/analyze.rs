//! Learns a new clause by analyzing a conflict.
use std::mem::swap;

use partial_ref::{partial, PartialRef};

use tern_formula::{Lit, Var};

use crate::clause::ClauseId;
use crate::context::{AnalyzeConflictP, ClauseStoreP, Context, ImplGraphP, TrailP, VsidsP};
use crate::prop::{Conflict, Reason};

/// Temporaries for conflict analysis.
#[derive(Default)]
pub struct AnalyzeConflict {
    /// The learned clause after analysis finishes, asserting literal in position 0.
    clause: Vec<Lit>,
    /// Number of literals of the current decision level still to resolve.
    current_level_count: usize,
    /// Scratch flag per variable: present in the current resolvent. All false outside of
    /// analysis.
    seen: Vec<bool>,
    /// Variables whose `seen` entry has to be cleared after analysis.
    to_clean: Vec<Var>,
    /// Clauses that took part in the resolution, for activity bumping.
    involved: Vec<ClauseId>,
}

impl AnalyzeConflict {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.seen.resize(count, false);
    }

    /// The learned clause.
    pub fn clause(&self) -> &[Lit] {
        &self.clause
    }

    /// Clauses involved in the conflict.
    pub fn involved(&self) -> &[ClauseId] {
        &self.involved
    }
}

/// Learns a new clause by analyzing a conflict.
///
/// Performs first-UIP resolution: starting from the conflicting clause, the literals of the
/// current decision level are resolved with their reason clauses, walking the trail backwards,
/// until exactly one literal of the current level remains. That literal's negation becomes the
/// asserting literal in position 0 of the learned clause. Position 1 receives the remaining
/// literal of maximal level; its level is returned as the backjump level.
///
/// Must only be called for conflicts above decision level 0.
pub fn analyze_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut VsidsP,
        ClauseStoreP,
        ImplGraphP,
        TrailP,
    ),
    conflict: Conflict,
) -> usize {
    {
        let analyze = ctx.part_mut(AnalyzeConflictP);
        analyze.clause.clear();
        analyze.involved.clear();
        analyze.current_level_count = 0;
        debug_assert!(analyze.seen.iter().all(|&flag| !flag));
    }

    let (store, mut ctx) = ctx.split_part(ClauseStoreP);
    let (trail, mut ctx) = ctx.split_part(TrailP);

    let current_level = trail.current_level();
    debug_assert!(current_level > 0);

    // We start with all literals of the conflicting clause.
    for &lit in store.lits(conflict.0) {
        add_literal(ctx.borrow(), lit, current_level);
    }
    ctx.part_mut(AnalyzeConflictP).involved.push(conflict.0);

    debug_assert!(ctx.part(AnalyzeConflictP).current_level_count > 0);

    // To get rid of all but one literal of the current level, we resolve the clause with the
    // reasons of those literals, in reverse chronological order. The trail walk stays within the
    // current decision level: it terminates at the first UIP, and the decision of the level is a
    // UIP if no earlier one exists.
    for &lit in trail.trail().iter().rev() {
        let analyze = ctx.part_mut(AnalyzeConflictP);
        if !analyze.seen[lit.index()] {
            continue;
        }
        analyze.seen[lit.index()] = false;
        analyze.current_level_count -= 1;

        if analyze.current_level_count == 0 {
            // lit is the sole remaining literal of the current level, so the resulting clause
            // asserts its negation; that goes in position 0.
            analyze.clause.push(!lit);
            let end = analyze.clause.len() - 1;
            analyze.clause.swap(0, end);
            break;
        }

        match ctx.part(ImplGraphP).reason(lit.var()) {
            Reason::Clause(reason_id) => {
                // The propagated literal sits in position 0 of its reason clause.
                debug_assert_eq!(store.lits(reason_id)[0], lit);
                for &reason_lit in &store.lits(reason_id)[1..] {
                    add_literal(ctx.borrow(), reason_lit, current_level);
                }
                ctx.part_mut(AnalyzeConflictP).involved.push(reason_id);
            }
            Reason::Decision => {
                // A decision inside the current level with literals still pending to resolve
                // would mean the trail or the counter is corrupt.
                unreachable!("decision reached during conflict resolution");
            }
        }
    }

    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);

    // Reset the scratch flags of the literals kept in the learned clause.
    for var in analyze.to_clean.drain(..) {
        analyze.seen[var.index()] = false;
    }

    // Find the literal with the highest level besides the asserting one and move it into
    // position 1, where it becomes the second watched literal. Its level is the backjump target.
    let mut backjump_to = 0;

    if analyze.clause.len() > 1 {
        let (prefix, rest) = analyze.clause.split_at_mut(2);
        let slot_1 = &mut prefix[1];
        backjump_to = ctx.part(ImplGraphP).level(slot_1.var());
        for lit in rest.iter_mut() {
            let lit_level = ctx.part(ImplGraphP).level(lit.var());
            if lit_level > backjump_to {
                backjump_to = lit_level;
                swap(slot_1, lit);
            }
        }
    }

    ctx.part_mut(VsidsP).decay();

    backjump_to
}

/// Add a literal to the current resolvent.
///
/// Literals assigned at level 0 are permanently false and drop out of the resolvent. Literals of
/// the current level are counted instead of added; they are resolved away or become the
/// asserting literal.
fn add_literal(
    mut ctx: partial!(Context, mut AnalyzeConflictP, mut VsidsP, ImplGraphP),
    lit: Lit,
    current_level: usize,
) {
    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);
    let lit_level = ctx.part(ImplGraphP).level(lit.var());

    if lit_level == 0 || analyze.seen[lit.index()] {
        return;
    }

    ctx.part_mut(VsidsP).bump(lit.var());
    analyze.seen[lit.index()] = true;

    if lit_level == current_level {
        analyze.current_level_count += 1;
    } else {
        analyze.clause.push(lit);
        analyze.to_clean.push(lit.var());
    }
}
