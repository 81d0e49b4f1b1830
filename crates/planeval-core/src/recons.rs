//! Action reconstruction distance.
//!
//! Structural distance between a reference action and a model-reconstructed
//! candidate: pair parameters positionally, rewrite the candidate's atoms
//! into the reference's parameter names, and count the per-polarity
//! symmetric differences over precondition and effect.
//!
//! The positional pairing assumes the natural-language descriptions list
//! parameters in declaration order, which holds for the corpus by
//! construction. A candidate that reorders its parameters is scored as if
//! it had misnamed them.

use std::collections::{BTreeSet, HashMap};

use planeval_model::ast::{Action, Formula, Predicate};

// ---------------------------------------------------------------------------
// Parameter correspondence
// ---------------------------------------------------------------------------

/// Map candidate parameter names onto the reference names declared at the
/// same position. Surplus parameters on the longer side map to themselves.
fn parameter_correspondence(original: &Action, candidate: &Action) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (o, c) in original.parameters.iter().zip(&candidate.parameters) {
        map.insert(c.clone(), o.clone());
    }
    let (shorter, longer) = if original.parameters.len() <= candidate.parameters.len() {
        (&original.parameters, &candidate.parameters)
    } else {
        (&candidate.parameters, &original.parameters)
    };
    for name in longer.iter().skip(shorter.len()) {
        map.insert(name.clone(), name.clone());
    }
    map
}

// ---------------------------------------------------------------------------
// Canonical atom rendering
// ---------------------------------------------------------------------------

/// Render atoms canonically with term names rewritten through `map`. Terms
/// without an entry (constants) pass through unchanged.
fn canonical_atoms(atoms: &BTreeSet<Predicate>, map: &HashMap<String, String>) -> BTreeSet<String> {
    atoms
        .iter()
        .map(|p| {
            let terms = p
                .terms
                .iter()
                .map(|t| map.get(t).cloned().unwrap_or_else(|| t.clone()))
                .collect();
            Predicate::new(p.name.clone(), terms).canonical()
        })
        .collect()
}

fn polarity_difference(
    original: &BTreeSet<Predicate>,
    candidate: &BTreeSet<Predicate>,
    map: &HashMap<String, String>,
) -> usize {
    let identity = HashMap::new();
    let original = canonical_atoms(original, &identity);
    let candidate = canonical_atoms(candidate, map);
    original.symmetric_difference(&candidate).count()
}

fn formula_difference(
    original: &Formula,
    candidate: &Formula,
    map: &HashMap<String, String>,
) -> usize {
    let (o_pos, o_neg) = original.positive_negative();
    let (c_pos, c_neg) = candidate.positive_negative();
    polarity_difference(&o_pos, &c_pos, map) + polarity_difference(&o_neg, &c_neg, map)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Structural distance between a reference action and its reconstruction.
///
/// Zero means identical up to variable renaming and atom order. Atom order
/// and conjunction nesting never affect the score; an atom whose polarity
/// flips between the two actions counts in both polarity buckets.
pub fn reconstruction_error(original: &Action, candidate: &Action) -> usize {
    let map = parameter_correspondence(original, candidate);
    formula_difference(&original.precondition, &candidate.precondition, &map)
        + formula_difference(&original.effect, &candidate.effect, &map)
}
