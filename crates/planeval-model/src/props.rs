//! Structural properties of parsed PDDL objects.

use std::collections::BTreeSet;

use crate::ast::{Action, Domain, Formula, Predicate};

/// All atoms of a formula, regardless of polarity.
pub fn atoms(formula: &Formula) -> BTreeSet<Predicate> {
    let (pos, neg) = formula.positive_negative();
    pos.union(&neg).cloned().collect()
}

/// Whether a formula contains both `(p ...)` and `(not (p ...))` over the
/// same atom.
pub fn has_contradiction(formula: &Formula) -> bool {
    let (pos, neg) = formula.positive_negative();
    pos.intersection(&neg).next().is_some()
}

/// Predicates that never appear in any action effect. These cannot change
/// value and are static for every reachable state.
pub fn obvious_static(domain: &Domain) -> BTreeSet<String> {
    let mut names = domain.predicate_names();
    for action in &domain.actions {
        for atom in atoms(&action.effect) {
            names.remove(&atom.name);
        }
    }
    names
}

/// Predicates that appear in at least one action effect.
pub fn possible_dynamic(domain: &Domain) -> BTreeSet<String> {
    let static_names = obvious_static(domain);
    domain
        .predicate_names()
        .into_iter()
        .filter(|n| !static_names.contains(n))
        .collect()
}

/// Atoms an action explicitly flips: positive in the precondition and
/// negated in the effect, or the reverse.
pub fn flipped_predicates(action: &Action) -> BTreeSet<Predicate> {
    let (pre_pos, pre_neg) = action.precondition.positive_negative();
    let (eff_pos, eff_neg) = action.effect.positive_negative();
    let mut flipped = BTreeSet::new();
    for atom in pre_pos.intersection(&eff_neg) {
        flipped.insert(atom.clone());
    }
    for atom in pre_neg.intersection(&eff_pos) {
        flipped.insert(atom.clone());
    }
    flipped
}
