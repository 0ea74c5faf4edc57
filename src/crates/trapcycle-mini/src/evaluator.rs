/// Evaluator for mini notation AST
///
/// Converts parsed AST nodes into trapcycle-core patterns
use crate::ast::*;
use crate::error::Result;
use crate::parser::parse;
use trapcycle_core::{
    pure, sequence, silence, stack, weighted_sequence, AbsoluteNote, Fraction, Pattern, Value,
};

/// Evaluate an AST node into a Pattern
///
/// Degrade operators draw from the thread RNG; use [`evaluate_seeded`] for
/// reproducible output.
pub fn evaluate(ast: &Ast) -> Pattern {
    Evaluator { seed: None }.eval(ast)
}

/// Evaluate with every `?` driven by a seeded generator
pub fn evaluate_seeded(ast: &Ast, seed: u64) -> Pattern {
    Evaluator { seed: Some(seed) }.eval(ast)
}

/// Parse and evaluate in one step
pub fn compile(source: &str) -> Result<Pattern> {
    Ok(evaluate(&parse(source)?))
}

pub fn compile_seeded(source: &str, seed: u64) -> Result<Pattern> {
    Ok(evaluate_seeded(&parse(source)?, seed))
}

struct Evaluator {
    seed: Option<u64>,
}

impl Evaluator {
    fn eval(&self, ast: &Ast) -> Pattern {
        match ast {
            Ast::Atom(atom) => eval_atom(atom),
            Ast::Pattern(pattern) => self.eval_pattern(pattern),
            Ast::Element(element) => self.eval_element(element),
        }
    }

    fn eval_pattern(&self, pattern: &PatternNode) -> Pattern {
        if pattern.children.is_empty() {
            return silence();
        }

        match pattern.alignment {
            Alignment::Sequence => {
                let weighted: Vec<(Pattern, i64)> = pattern
                    .children
                    .iter()
                    .map(|child| (self.eval(child), weight_of(child)))
                    .collect();

                if weighted.iter().all(|(_, w)| *w == 1) {
                    sequence(weighted.into_iter().map(|(p, _)| p).collect())
                } else {
                    weighted_sequence(
                        weighted
                            .into_iter()
                            .map(|(p, w)| (p, Fraction::from_int(w)))
                            .collect(),
                    )
                }
            }
            Alignment::Stack => stack(pattern.children.iter().map(|c| self.eval(c)).collect()),
            Alignment::Slowcat => {
                // One element per cycle: a sequence slowed by its length, so
                // each element runs on its own cycle count. Each element
                // appears `reps` times in the rotation.
                let mut expanded = Vec::new();
                for child in &pattern.children {
                    let reps = match child {
                        Ast::Element(e) => e.reps,
                        _ => 1,
                    };
                    if reps == 0 {
                        continue;
                    }
                    let pat = self.eval(child);
                    expanded.extend(std::iter::repeat(pat).take(reps));
                }

                match expanded.len() {
                    0 => silence(),
                    1 => expanded.remove(0),
                    n => sequence(expanded).slow(Fraction::from_int(n as i64)),
                }
            }
        }
    }

    fn eval_element(&self, element: &ElementNode) -> Pattern {
        let mut pat = self.eval(&element.source);

        for op in &element.ops {
            pat = match op {
                SliceOp::Stretch { amount, op_type } => match op_type {
                    StretchType::Fast => pat.fast(*amount),
                    StretchType::Slow => pat.slow(*amount),
                },
                SliceOp::Replicate { amount } => pat.replicate(*amount),
                SliceOp::DegradeBy { keep, seed } => match self.seed {
                    Some(base) => pat.degrade_seeded(*keep, base ^ seed),
                    None => pat.degrade(*keep),
                },
            };
        }

        pat
    }
}

fn eval_atom(atom: &AtomNode) -> Pattern {
    match &atom.value {
        AtomValue::Number(n) => pure(Value::Number(*n)),
        AtomValue::Note { pitch, .. } => pure(Value::Note(AbsoluteNote(*pitch))),
        AtomValue::Silence => pure(Value::Rest),
    }
}

fn weight_of(ast: &Ast) -> i64 {
    match ast {
        Ast::Element(e) => e.weight,
        _ => 1,
    }
}
