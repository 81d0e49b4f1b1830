//! Reference PDDL parser.
//!
//! Parses the STRIPS subset the reference corpus is written in: typed
//! parameter lists are accepted (types are discarded), formulas are `and` /
//! `not` / atom. Anything richer (quantifiers, conditional effects) is
//! rejected; the reference corpus is required to stay inside the subset the
//! downstream comparator can observe.

use crate::ast::{Action, Domain, Formula, Predicate, PredicateSig, Problem};

/// Errors produced while parsing reference PDDL text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("unsupported connective: {0}")]
    UnsupportedConnective(String),

    #[error("top-level form is neither a domain nor a problem")]
    UnknownForm,
}

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// A classified top-level PDDL file.
#[derive(Debug, Clone, PartialEq)]
pub enum PddlFile {
    Domain(Domain),
    Problem(Problem),
}

// ---------------------------------------------------------------------------
// S-expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl Sexp {
    fn as_atom(&self) -> Option<&str> {
        match self {
            Sexp::Atom(s) => Some(s),
            Sexp::List(_) => None,
        }
    }

    fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Sexp::List(items) => Some(items),
            Sexp::Atom(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Sexp::Atom(s) => s.clone(),
            Sexp::List(_) => "(...)".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            ';' => {
                // Line comment.
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_sexp(tokens: &[String], pos: &mut usize) -> Result<Sexp> {
    let token = tokens.get(*pos).ok_or(ParseError::UnexpectedEnd)?;
    *pos += 1;
    match token.as_str() {
        "(" => {
            let mut items = Vec::new();
            loop {
                match tokens.get(*pos) {
                    None => return Err(ParseError::UnbalancedParens),
                    Some(t) if t == ")" => {
                        *pos += 1;
                        return Ok(Sexp::List(items));
                    }
                    Some(_) => items.push(parse_sexp(tokens, pos)?),
                }
            }
        }
        ")" => Err(ParseError::UnbalancedParens),
        atom => Ok(Sexp::Atom(atom.to_lowercase())),
    }
}

fn parse_top_level(input: &str) -> Result<Sexp> {
    let tokens = tokenize(input);
    let mut pos = 0;
    let sexp = parse_sexp(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(ParseError::Unexpected {
            expected: "end of input".to_string(),
            found: tokens[pos].clone(),
        });
    }
    Ok(sexp)
}

// ---------------------------------------------------------------------------
// PDDL extraction
// ---------------------------------------------------------------------------

/// Strip a typed parameter list down to bare names: `?x ?y - block ?z`
/// becomes `[x, y, z]`. The `- type` annotations are discarded.
fn variable_names(items: &[Sexp]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut skip_next = false;
    for item in items {
        let atom = item.as_atom().ok_or_else(|| ParseError::Unexpected {
            expected: "parameter name".to_string(),
            found: item.describe(),
        })?;
        if skip_next {
            skip_next = false;
            continue;
        }
        if atom == "-" {
            skip_next = true;
            continue;
        }
        names.push(atom.trim_start_matches('?').to_string());
    }
    Ok(names)
}

fn parse_predicate(items: &[Sexp]) -> Result<Predicate> {
    let (head, rest) = items.split_first().ok_or_else(|| ParseError::Unexpected {
        expected: "predicate name".to_string(),
        found: "()".to_string(),
    })?;
    let name = head.as_atom().ok_or_else(|| ParseError::Unexpected {
        expected: "predicate name".to_string(),
        found: head.describe(),
    })?;
    Ok(Predicate::new(name, variable_names(rest)?))
}

fn parse_formula(sexp: &Sexp) -> Result<Formula> {
    let items = sexp.as_list().ok_or_else(|| ParseError::Unexpected {
        expected: "formula".to_string(),
        found: sexp.describe(),
    })?;
    match items.first().and_then(Sexp::as_atom) {
        None => Ok(Formula::empty()),
        Some("and") => {
            let operands = items[1..]
                .iter()
                .map(parse_formula)
                .collect::<Result<Vec<_>>>()?;
            Ok(Formula::And(operands))
        }
        Some("not") => {
            let inner = items.get(1).ok_or(ParseError::UnexpectedEnd)?;
            Ok(Formula::Not(Box::new(parse_formula(inner)?)))
        }
        Some(head @ ("or" | "imply" | "forall" | "exists" | "when")) => {
            Err(ParseError::UnsupportedConnective(head.to_string()))
        }
        Some(_) => Ok(Formula::Atom(parse_predicate(items)?)),
    }
}

fn parse_action(items: &[Sexp]) -> Result<Action> {
    // items: [":action", name, key, value, key, value, ...]
    let name = items
        .get(1)
        .and_then(Sexp::as_atom)
        .ok_or_else(|| ParseError::Unexpected {
            expected: "action name".to_string(),
            found: items.get(1).map(Sexp::describe).unwrap_or_default(),
        })?
        .to_string();

    let mut parameters = Vec::new();
    let mut precondition = Formula::empty();
    let mut effect = Formula::empty();

    let mut idx = 2;
    while idx < items.len() {
        let key = items[idx].as_atom().ok_or_else(|| ParseError::Unexpected {
            expected: "action keyword".to_string(),
            found: items[idx].describe(),
        })?;
        let value = items.get(idx + 1).ok_or(ParseError::UnexpectedEnd)?;
        match key {
            ":parameters" => {
                let list = value.as_list().ok_or_else(|| ParseError::Unexpected {
                    expected: "parameter list".to_string(),
                    found: value.describe(),
                })?;
                parameters = variable_names(list)?;
            }
            ":precondition" => precondition = parse_formula(value)?,
            ":effect" => effect = parse_formula(value)?,
            other => {
                return Err(ParseError::Unexpected {
                    expected: ":parameters, :precondition or :effect".to_string(),
                    found: other.to_string(),
                })
            }
        }
        idx += 2;
    }

    Ok(Action {
        name,
        parameters,
        precondition,
        effect,
    })
}

fn parse_domain_body(sections: &[Sexp]) -> Result<Domain> {
    let mut name = String::new();
    let mut predicates = Vec::new();
    let mut actions = Vec::new();

    for section in sections {
        let items = match section.as_list() {
            Some(items) => items,
            None => continue,
        };
        match items.first().and_then(Sexp::as_atom) {
            Some("domain") => {
                name = items
                    .get(1)
                    .and_then(Sexp::as_atom)
                    .ok_or(ParseError::UnexpectedEnd)?
                    .to_string();
            }
            Some(":predicates") => {
                for decl in &items[1..] {
                    let decl_items = decl.as_list().ok_or_else(|| ParseError::Unexpected {
                        expected: "predicate declaration".to_string(),
                        found: decl.describe(),
                    })?;
                    let pred = parse_predicate(decl_items)?;
                    predicates.push(PredicateSig {
                        name: pred.name,
                        parameters: pred.terms,
                    });
                }
            }
            Some(":action") => actions.push(parse_action(items)?),
            // :requirements, :types, :constants carry nothing we observe.
            _ => {}
        }
    }

    Ok(Domain {
        name,
        predicates,
        actions,
    })
}

fn parse_problem_body(sections: &[Sexp]) -> Result<Problem> {
    let mut name = String::new();
    let mut domain_name = String::new();
    for section in sections {
        let items = match section.as_list() {
            Some(items) => items,
            None => continue,
        };
        match items.first().and_then(Sexp::as_atom) {
            Some("problem") => {
                name = items
                    .get(1)
                    .and_then(Sexp::as_atom)
                    .ok_or(ParseError::UnexpectedEnd)?
                    .to_string();
            }
            Some(":domain") => {
                domain_name = items
                    .get(1)
                    .and_then(Sexp::as_atom)
                    .ok_or(ParseError::UnexpectedEnd)?
                    .to_string();
            }
            _ => {}
        }
    }
    Ok(Problem { name, domain_name })
}

/// Parse a PDDL file and classify it by its top-level form.
///
/// `(define (domain ...) ...)` yields a domain, `(define (problem ...) ...)`
/// a problem; anything else is an error the caller treats as a corrupt
/// reference corpus.
pub fn parse_pddl_file(input: &str) -> Result<PddlFile> {
    let top = parse_top_level(input)?;
    let items = top.as_list().ok_or(ParseError::UnknownForm)?;
    if items.first().and_then(Sexp::as_atom) != Some("define") {
        return Err(ParseError::UnknownForm);
    }
    let head = items
        .get(1)
        .and_then(Sexp::as_list)
        .and_then(|l| l.first())
        .and_then(Sexp::as_atom);
    match head {
        Some("domain") => Ok(PddlFile::Domain(parse_domain_body(&items[1..])?)),
        Some("problem") => Ok(PddlFile::Problem(parse_problem_body(&items[1..])?)),
        _ => Err(ParseError::UnknownForm),
    }
}

/// Parse a standalone `(:action ...)` form, as it appears in task records
/// and accepted model outputs.
pub fn parse_action_text(input: &str) -> Result<Action> {
    let top = parse_top_level(input)?;
    let items = top.as_list().ok_or_else(|| ParseError::Unexpected {
        expected: "(:action ...)".to_string(),
        found: top.describe(),
    })?;
    if items.first().and_then(Sexp::as_atom) != Some(":action") {
        return Err(ParseError::Unexpected {
            expected: "(:action ...)".to_string(),
            found: items.first().map(Sexp::describe).unwrap_or_default(),
        });
    }
    parse_action(items)
}
