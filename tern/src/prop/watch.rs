//! Watchlists to detect clauses that became unit.
//!
//! Every stored clause of length two or more has exactly two watchers, one for each of its first
//! two literals. The watcher for a literal is kept in that literal's watch list. Whenever
//! propagation moves a watch to a different literal it also permutes the clause so the watched
//! literals stay in positions 0 and 1.
//!
//! While a clause is neither unit nor false, its watched positions hold two non-false literals.
//! When one watched literal is assigned false, the watchers of that literal are scanned: each
//! affected clause either turns out satisfied, finds a replacement watched literal, becomes unit,
//! or is found false. Backtracking never invalidates the invariant, so watchlists need no repair
//! on backtrack.
//!
//! Each watcher additionally carries a blocking literal, some other literal of the clause. When
//! the blocker is already true the clause is satisfied and the clause body is never touched. See
//! [Section 4.5.1 of the "Handbook of Satisfiability"][handbook-ch4] for more details and
//! references.
//!
//! [handbook-ch4]: https://www.satassociation.org/articles/FAIA185-0131.pdf
use std::mem::replace;

use tern_formula::Lit;

use crate::clause::{ClauseId, ClauseStore};

/// A watcher entry.
#[derive(Copy, Clone)]
pub struct Watch {
    /// Clause which has the referring literal in position 0 or 1.
    pub clause: ClauseId,
    /// A literal of the clause, different from the referring literal.
    pub blocking: Lit,
}

/// Watchlists to detect clauses that became unit.
#[derive(Default)]
pub struct Watchlists {
    /// Indexed by literal code; the list of a literal holds the clauses watching it.
    watches: Vec<Vec<Watch>>,
}

impl Watchlists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, vec![]);
    }

    /// Start watching a clause.
    ///
    /// `lits` have to be the first two literals of the given clause.
    pub fn watch_clause(&mut self, clause: ClauseId, lits: [Lit; 2]) {
        for i in 0..2 {
            self.watches[lits[i].code()].push(Watch {
                clause,
                blocking: lits[i ^ 1],
            });
        }
    }

    /// Make a literal watch a clause.
    pub fn add_watch(&mut self, lit: Lit, watch: Watch) {
        self.watches[lit.code()].push(watch)
    }

    /// Watchers of a given literal.
    pub fn watched_by(&self, lit: Lit) -> &[Watch] {
        &self.watches[lit.code()]
    }

    /// Move a literal's watch list out for in-place compaction.
    ///
    /// Adding watches for _other_ literals is allowed while the list is taken out. Return the
    /// compacted list with [`put_back`](Watchlists::put_back).
    pub fn take(&mut self, lit: Lit) -> Vec<Watch> {
        replace(&mut self.watches[lit.code()], vec![])
    }

    /// Return a list taken with [`take`](Watchlists::take).
    pub fn put_back(&mut self, lit: Lit, list: Vec<Watch>) {
        debug_assert!(self.watches[lit.code()].is_empty());
        self.watches[lit.code()] = list;
    }

    /// Remove all watchers that refer to deleted clauses.
    ///
    /// Has to run before the clause store reclaims the storage of deleted clauses.
    pub fn purge_deleted(&mut self, store: &ClauseStore) {
        for list in &mut self.watches {
            list.retain(|watch| !store.is_deleted(watch.clause));
        }
    }
}
