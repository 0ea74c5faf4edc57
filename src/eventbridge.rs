//! Pattern evaluation for tools and scripts
//!
//! Parses and queries notation strings and returns plain serializable
//! results: events with float times, parse errors with line/column.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use trapcycle_core::{scales, Fraction, Hap, PitchResolver, Scale, TimeSpan, Value};
use trapcycle_mini::{evaluate, evaluate_seeded, parse, ParseError};

/// Error type for pattern commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternError {
    pub message: String,
    pub location: Option<ErrorLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLocation {
    /// 1-based
    pub line: usize,
    /// 1-based, in characters
    pub column: usize,
    pub span_start: usize,
    pub span_end: usize,
}

impl ErrorLocation {
    fn in_source(source: &str, start: usize, end: usize) -> Self {
        let before = source.get(..start).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;

        ErrorLocation {
            line,
            column,
            span_start: start,
            span_end: end,
        }
    }
}

impl PatternError {
    pub fn from_parse(err: &ParseError, source: &str) -> Self {
        let span = err.span();
        PatternError {
            message: err.to_string(),
            location: Some(ErrorLocation::in_source(source, span.start, span.end)),
        }
    }
}

impl From<String> for PatternError {
    fn from(message: String) -> Self {
        PatternError {
            message,
            location: None,
        }
    }
}

/// Serializable version of Hap with float times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableHap {
    pub value: Value,
    /// Resolved pitch, when a resolver was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<i32>,
    pub part_begin: f64,
    pub part_end: f64,
    pub whole_begin: Option<f64>,
    pub whole_end: Option<f64>,
    pub onset: bool,
}

impl From<Hap> for SerializableHap {
    fn from(hap: Hap) -> Self {
        SerializableHap {
            onset: hap.has_onset(),
            value: hap.value,
            pitch: None,
            part_begin: hap.part.begin.to_float(),
            part_end: hap.part.end.to_float(),
            whole_begin: hap.whole.as_ref().map(|ts| ts.begin.to_float()),
            whole_end: hap.whole.as_ref().map(|ts| ts.end.to_float()),
        }
    }
}

/// Check a pattern for syntax errors
pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    parse(pattern).map_err(|e| PatternError::from_parse(&e, pattern))?;
    Ok(())
}

/// Build the resolver for an optional `root:name` scale
pub fn resolver_for(scale: Option<&str>, root: i32) -> Result<PitchResolver, PatternError> {
    match scale {
        Some(text) => Scale::parse(text, &scales())
            .map(PitchResolver::Scale)
            .map_err(|e| PatternError::from(e.to_string())),
        None => Ok(PitchResolver::Chromatic { root }),
    }
}

/// Query a pattern over `[from, from + duration)` cycles
pub fn evaluate_pattern(
    pattern: &str,
    from_cycle: f64,
    duration_cycles: f64,
    seed: Option<u64>,
    resolver: Option<&PitchResolver>,
) -> Result<Vec<SerializableHap>, PatternError> {
    let ast = parse(pattern).map_err(|e| PatternError::from_parse(&e, pattern))?;
    let pat = match seed {
        Some(seed) => evaluate_seeded(&ast, seed),
        None => evaluate(&ast),
    };

    let begin = Fraction::from_float(from_cycle);
    let end = Fraction::from_float(from_cycle + duration_cycles);
    let haps = pat.query(TimeSpan::new(begin, end));

    Ok(haps
        .into_iter()
        .map(|hap| {
            let pitch = resolver.and_then(|r| r.resolve(&hap.value));
            SerializableHap {
                pitch,
                ..SerializableHap::from(hap)
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMetrics {
    pub event_count: usize,
    pub rest_count: usize,
    pub density: f64,
    pub cycles: f64,
    pub unique_values: Vec<String>,
}

/// Count onsets and distinct values over the first `cycles` cycles
pub fn analyze_pattern(
    pattern: &str,
    cycles: f64,
    seed: Option<u64>,
) -> Result<PatternMetrics, PatternError> {
    let haps: Vec<SerializableHap> = evaluate_pattern(pattern, 0.0, cycles, seed, None)?
        .into_iter()
        .filter(|h| h.onset)
        .collect();

    let rest_count = haps.iter().filter(|h| h.value.is_rest()).count();
    let event_count = haps.len() - rest_count;
    let density = if cycles > 0.0 {
        event_count as f64 / cycles
    } else {
        0.0
    };

    let unique_values: BTreeSet<String> = haps
        .iter()
        .filter(|h| !h.value.is_rest())
        .map(|h| h.value.to_string())
        .collect();

    Ok(PatternMetrics {
        event_count,
        rest_count,
        density,
        cycles,
        unique_values: unique_values.into_iter().collect(),
    })
}
