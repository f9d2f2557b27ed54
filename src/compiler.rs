//! Compiles raw grammar documents into classes and options.
//!
//! A document is a mapping. Keys starting with `^` are directives: `^include`
//! merges other documents in place, anything else is kept as an option.
//! Every other key defines a class:
//!
//! - a string is a simple expression, e.g. `"$a + $b"`
//! - a mapping is a probabilistic choice, e.g. `{ x: 30%, y: auto }`
//! - a list is a uniform choice over its elements

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::grammar::{
    Class, Content, DIRECTIVE_MARKER, Element, Expression, GrammarBuilder, GrammarConfig,
    ProbabilisticChoice, REFERENCE_MARKER, RangeKeys, Variation,
};
use crate::range::{self, RangeResult};
use crate::utils::{GrammarError, Result};

const INCLUDE_DIRECTIVE: &str = "include";
const AUTO_PROBABILITY: &str = "auto";

// Declared percentages may overshoot 100 by rounding noise only.
const PERCENT_EPSILON: f64 = 1e-9;

static PERCENTAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)\s*%$").unwrap()
});

/// A parsed probability specification
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Probability {
    /// `NN%`
    Percent(f64),
    /// `auto`: share whatever percentage is left
    Auto,
}

/// Parse `"NN%"` or `"auto"`.
pub fn parse_probability(spec: &str) -> Option<Probability> {
    let spec = spec.trim();
    if spec == AUTO_PROBABILITY {
        return Some(Probability::Auto);
    }
    let captures = PERCENTAGE.captures(spec)?;
    captures[1].parse().ok().map(Probability::Percent)
}

/// Read a grammar document from disk
pub fn load_document(path: &Path) -> Result<Value> {
    let source = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&source)?)
}

/// Load and compile a document file at the given include depth
pub fn compile_file(path: &Path, depth: usize, config: &GrammarConfig) -> Result<GrammarBuilder> {
    let compiled = load_document(path).and_then(|document| {
        compile(&document, path.parent(), depth, config)
    });
    let builder = compiled.map_err(|err| err.in_document(path))?;

    info!(
        path = %path.display(),
        depth,
        classes = builder.classes().len(),
        "compiled grammar document"
    );
    Ok(builder)
}

/// Compile one raw document
///
/// `search_dir` is the directory of the document, used for relative
/// includes. `depth` is the include depth of the document itself.
pub fn compile(
    document: &Value,
    search_dir: Option<&Path>,
    depth: usize,
    config: &GrammarConfig,
) -> Result<GrammarBuilder> {
    let mut builder = GrammarBuilder::new().config(config.clone());

    let mapping = match document {
        Value::Null => return Ok(builder),
        Value::Mapping(mapping) => mapping,
        _ => return Err(GrammarError::InvalidDocument),
    };

    for (key, value) in mapping {
        let key = key_text(key)?;
        if let Some(directive) = key.strip_prefix(DIRECTIVE_MARKER) {
            compile_directive(&mut builder, directive, value, search_dir, depth, config)?;
        } else {
            let class = compile_class(&key, value, config)?;
            builder.insert_class(key, class);
        }
    }

    Ok(builder)
}

fn compile_directive(
    builder: &mut GrammarBuilder,
    name: &str,
    value: &Value,
    search_dir: Option<&Path>,
    depth: usize,
    config: &GrammarConfig,
) -> Result<()> {
    if name != INCLUDE_DIRECTIVE {
        // Option keys are stored without the directive marker: `^seed` is `seed`.
        builder.insert_option(name.to_string(), value.clone());
        return Ok(());
    }

    for path in include_paths(value)? {
        let included = resolve_include(path, search_dir, depth, config)?;
        debug!(
            include = path,
            classes = included.classes().len(),
            "merging included document"
        );
        builder.merge(included);
    }
    Ok(())
}

fn include_paths(value: &Value) -> Result<Vec<&str>> {
    match value {
        Value::String(path) => Ok(vec![path.as_str()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| GrammarError::InvalidInclude(describe(item)))
            })
            .collect(),
        other => Err(GrammarError::InvalidInclude(describe(other))),
    }
}

/// Load and compile an included document
///
/// `current_depth` is the depth of the including document. The path is tried
/// as given, then relative to `originating_dir`.
pub fn resolve_include(
    path: &str,
    originating_dir: Option<&Path>,
    current_depth: usize,
    config: &GrammarConfig,
) -> Result<GrammarBuilder> {
    let depth = current_depth + 1;
    if depth >= config.max_include_depth {
        return Err(GrammarError::IncludeDepth {
            path: PathBuf::from(path),
            limit: config.max_include_depth,
        });
    }

    let found = find_include(path, originating_dir)
        .ok_or_else(|| GrammarError::IncludeNotFound(PathBuf::from(path)))?;
    debug!(include = path, resolved = %found.display(), depth, "resolving include");

    compile_file(&found, depth, config)
}

fn find_include(path: &str, originating_dir: Option<&Path>) -> Option<PathBuf> {
    let direct = PathBuf::from(path);
    if direct.is_file() {
        return Some(direct);
    }
    let relative = originating_dir?.join(path);
    relative.is_file().then_some(relative)
}

fn compile_class(name: &str, value: &Value, config: &GrammarConfig) -> Result<Class> {
    match value {
        Value::String(text) => Ok(compile_simple_expression(text).into()),
        Value::Mapping(variants) => Ok(Class::Choice(compile_choice(name, variants, config)?)),
        Value::Sequence(items) => {
            let mut variants = Mapping::new();
            for item in items {
                let text = scalar_text(item).ok_or_else(|| GrammarError::InvalidClassContent {
                    class: name.to_string(),
                })?;
                // Repeated elements keep their first position.
                variants.insert(Value::String(text), Value::from(AUTO_PROBABILITY));
            }
            Ok(Class::Choice(compile_choice(name, &variants, config)?))
        }
        _ => Err(GrammarError::InvalidClassContent {
            class: name.to_string(),
        }),
    }
}

/// Compile a space separated expression; ranges are not interpreted.
pub fn compile_simple_expression(text: &str) -> Content {
    let elements: Vec<Element> = text.trim().split(' ').map(compile_token).collect();

    if let [Element::Literal(text)] = elements.as_slice() {
        return Content::Literal(text.clone());
    }
    Content::Expression(Expression { elements })
}

fn compile_token(token: &str) -> Element {
    match class_name(token) {
        Some(name) => Element::ClassRef(name.to_string()),
        None => Element::Literal(token.to_string()),
    }
}

fn class_name(token: &str) -> Option<&str> {
    token
        .strip_prefix(REFERENCE_MARKER)
        .filter(|name| !name.is_empty())
}

/// Compile a choice key; a range key expands to one content per character.
fn compile_key(class: &str, key: &str, config: &GrammarConfig) -> Result<Vec<Content>> {
    let key = key.trim();
    let single_token = !key.contains(' ') && class_name(key).is_none();
    let wants_range = match config.range_keys {
        RangeKeys::Explicit => range::has_range_syntax(key),
        RangeKeys::Always => true,
    };

    if !(single_token && wants_range) {
        return Ok(vec![compile_simple_expression(key)]);
    }

    let parsed = range::parse_range(key).map_err(|err| GrammarError::RangeSyntax {
        class: class.to_string(),
        input: key.to_string(),
        reason: err.to_string(),
    })?;

    Ok(match parsed {
        RangeResult::Literal(text) => vec![Content::Literal(text)],
        RangeResult::CharSet(chars) => chars
            .into_iter()
            .map(|c| Content::Literal(c.to_string()))
            .collect(),
    })
}

/// Compile the `(key, probability)` pairs of a probabilistic choice
pub fn compile_choice(
    class: &str,
    variants: &Mapping,
    config: &GrammarConfig,
) -> Result<ProbabilisticChoice> {
    let mut variations = Vec::new();
    let mut deferred = Vec::new();
    let mut left = 100.0_f64;

    for (key, spec) in variants {
        let contents = compile_key(class, &key_text(key)?, config)?;

        let spec_text = scalar_text(spec).unwrap_or_else(|| describe(spec));
        match parse_probability(&spec_text) {
            Some(Probability::Percent(percent)) => {
                left -= percent;
                if left < -PERCENT_EPSILON {
                    return Err(GrammarError::ProbabilityOverflow {
                        class: class.to_string(),
                    });
                }
                let each = percent / contents.len() as f64;
                variations.extend(
                    contents
                        .into_iter()
                        .map(|content| Variation { content, weight: each }),
                );
            }
            Some(Probability::Auto) => deferred.extend(contents),
            None => {
                return Err(GrammarError::UnreadableProbability {
                    class: class.to_string(),
                    spec: spec_text,
                });
            }
        }
    }

    if !deferred.is_empty() {
        let each = left.max(0.0) / deferred.len() as f64;
        variations.extend(
            deferred
                .into_iter()
                .map(|content| Variation { content, weight: each }),
        );
    }

    Ok(ProbabilisticChoice { variations })
}

/// Text of a scalar value; numbers and booleans use their YAML spelling.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn key_text(key: &Value) -> Result<String> {
    scalar_text(key).ok_or_else(|| GrammarError::InvalidKey(describe(key)))
}

fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}
