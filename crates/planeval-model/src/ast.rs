//! PDDL syntax tree for reference domains and problems.
//!
//! The model covers the STRIPS subset the reference corpus uses: predicate
//! atoms composed with negation and conjunction. Everything is immutable
//! once parsed and serde-serialisable so the knowledge store can persist it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A predicate atom: name plus ordered term names.
///
/// Terms are variable names with the leading `?` stripped, or constants as
/// written. Equality is structural (name + ordered terms).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub terms: Vec<String>,
}

impl Predicate {
    pub fn new(name: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            name: name.into(),
            terms,
        }
    }

    /// Canonical s-expression rendering: `(name term1 term2 ...)`.
    pub fn canonical(&self) -> String {
        if self.terms.is_empty() {
            format!("({})", self.name)
        } else {
            format!("({} {})", self.name, self.terms.join(" "))
        }
    }
}

/// A precondition or effect formula.
///
/// Only the flattened positive/negated atom sets are ever observed
/// downstream; conjunction nesting and atom order carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    Atom(Predicate),
    Not(Box<Formula>),
    And(Vec<Formula>),
}

impl Formula {
    /// The empty conjunction, used for absent preconditions and effects.
    pub fn empty() -> Self {
        Formula::And(Vec::new())
    }

    /// Flatten into (positive, negated) atom sets.
    ///
    /// Conjunctions are walked recursively; a bare atom lands in the
    /// positive set, a negated atom in the negated set. Negations wrapping
    /// anything other than an atom are ignored, as are quantified forms the
    /// parser does not admit.
    pub fn positive_negative(&self) -> (BTreeSet<Predicate>, BTreeSet<Predicate>) {
        let mut pos = BTreeSet::new();
        let mut neg = BTreeSet::new();
        self.collect_atoms(&mut pos, &mut neg);
        (pos, neg)
    }

    fn collect_atoms(&self, pos: &mut BTreeSet<Predicate>, neg: &mut BTreeSet<Predicate>) {
        match self {
            Formula::Atom(p) => {
                pos.insert(p.clone());
            }
            Formula::Not(inner) => {
                if let Formula::Atom(p) = inner.as_ref() {
                    neg.insert(p.clone());
                }
            }
            Formula::And(operands) => {
                for operand in operands {
                    operand.collect_atoms(pos, neg);
                }
            }
        }
    }
}

/// A declared predicate signature (name + declared parameter names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSig {
    pub name: String,
    pub parameters: Vec<String>,
}

impl PredicateSig {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// A PDDL action schema.
///
/// Parameter order is semantically load-bearing: the reconstruction-error
/// comparator pairs parameters positionally across actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub parameters: Vec<String>,
    pub precondition: Formula,
    pub effect: Formula,
}

/// A parsed PDDL domain. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain name; the unique key everywhere downstream.
    pub name: String,
    /// Declared predicate signatures, in declaration order.
    pub predicates: Vec<PredicateSig>,
    pub actions: Vec<Action>,
}

impl Domain {
    /// Look up an action schema by name.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Names of all declared predicates.
    pub fn predicate_names(&self) -> BTreeSet<String> {
        self.predicates.iter().map(|p| p.name.clone()).collect()
    }
}

/// A parsed PDDL problem header.
///
/// Only the identity matters here; initial state and goal stay with the
/// source file, which is handed verbatim to the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    /// Domain name as declared in the problem's `(:domain ...)` clause.
    /// Matched against known domains by substring, not equality.
    pub domain_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(name: &str, terms: &[&str]) -> Formula {
        Formula::Atom(Predicate::new(name, terms.iter().map(|t| t.to_string()).collect()))
    }

    #[test]
    fn test_canonical_rendering() {
        let p = Predicate::new("on", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(p.canonical(), "(on a b)");

        let nullary = Predicate::new("handempty", vec![]);
        assert_eq!(nullary.canonical(), "(handempty)");
    }

    #[test]
    fn test_positive_negative_split() {
        let formula = Formula::And(vec![
            atom("clear", &["x"]),
            Formula::Not(Box::new(atom("ontable", &["x"]))),
            atom("handempty", &[]),
        ]);
        let (pos, neg) = formula.positive_negative();
        assert_eq!(pos.len(), 2);
        assert_eq!(neg.len(), 1);
        assert!(neg.contains(&Predicate::new("ontable", vec!["x".to_string()])));
    }

    #[test]
    fn test_nested_conjunctions_flatten() {
        let formula = Formula::And(vec![
            atom("p", &["x"]),
            Formula::And(vec![
                atom("q", &["x"]),
                Formula::Not(Box::new(atom("r", &["x"]))),
            ]),
        ]);
        let (pos, neg) = formula.positive_negative();
        assert_eq!(pos.len(), 2);
        assert_eq!(neg.len(), 1);
    }

    #[test]
    fn test_duplicate_atoms_deduplicate() {
        let formula = Formula::And(vec![atom("p", &["x"]), atom("p", &["x"])]);
        let (pos, _) = formula.positive_negative();
        assert_eq!(pos.len(), 1);
    }

    #[test]
    fn test_empty_formula_has_no_atoms() {
        let (pos, neg) = Formula::empty().positive_negative();
        assert!(pos.is_empty());
        assert!(neg.is_empty());
    }
}
