use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

use crate::compiler;
use crate::utils::Result;
use crate::validate;

/// Prefix of directive keys (`^include`, `^seed`, ...)
pub const DIRECTIVE_MARKER: char = '^';
/// Prefix of class references inside expressions (`$name`)
pub const REFERENCE_MARKER: char = '$';

/// A token of an expression, either literal text or a reference to another class
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Literal text, emitted as-is
    Literal(String),
    /// Reference to another class, resolved by name at expansion time
    ClassRef(String),
}

/// An ordered sequence of elements
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub elements: Vec<Element>,
}

/// What a variation expands to
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Literal(String),
    Expression(Expression),
}

/// A weighted alternative of a probabilistic choice
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub content: Content,
    /// Relative weight; selection probability is weight / sum of weights
    pub weight: f64,
}

/// A weighted set of alternatives, kept in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbabilisticChoice {
    pub variations: Vec<Variation>,
}

impl ProbabilisticChoice {
    pub fn total_weight(&self) -> f64 {
        self.variations.iter().map(|v| v.weight).sum()
    }
}

/// A compiled grammar rule
#[derive(Debug, Clone, PartialEq)]
pub enum Class {
    Literal(String),
    Expression(Expression),
    Choice(ProbabilisticChoice),
}

impl From<Content> for Class {
    fn from(content: Content) -> Self {
        match content {
            Content::Literal(text) => Class::Literal(text),
            Content::Expression(expr) => Class::Expression(expr),
        }
    }
}

/// How single-token keys of a probabilistic choice are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeKeys {
    /// Only keys using range syntax (`-` or `\`) become character sets
    #[default]
    Explicit,
    /// Every single non-reference key is parsed as a range, so `abc` is three variations
    Always,
}

/// Configuration options for loading and expanding grammars
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Include requests at this depth are rejected
    pub max_include_depth: usize,
    /// Maximum nesting of class expansions (guards against reference cycles)
    pub max_expansion_depth: usize,
    /// Range handling for probabilistic choice keys
    pub range_keys: RangeKeys,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            max_include_depth: 10,
            max_expansion_depth: 100,
            range_keys: RangeKeys::Explicit,
        }
    }
}

/// A fully compiled and validated grammar
///
/// Immutable once built; any number of evaluators may read it.
#[derive(Debug, Clone)]
pub struct Grammar {
    classes: IndexMap<String, Class>,
    options: IndexMap<String, Value>,
    config: GrammarConfig,
}

impl Grammar {
    /// Load a grammar document from a file, resolving its includes
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_config(path, GrammarConfig::default())
    }

    pub fn from_file_with_config<P: AsRef<Path>>(path: P, config: GrammarConfig) -> Result<Self> {
        compiler::compile_file(path.as_ref(), 0, &config)?.build()
    }

    /// Compile a grammar from YAML text
    ///
    /// Relative includes are looked up in `base_dir` when they cannot be
    /// found as given.
    pub fn from_yaml_str(source: &str, base_dir: Option<&Path>) -> Result<Self> {
        Self::from_yaml_str_with_config(source, base_dir, GrammarConfig::default())
    }

    pub fn from_yaml_str_with_config(
        source: &str,
        base_dir: Option<&Path>,
        config: GrammarConfig,
    ) -> Result<Self> {
        let document: Value = serde_yaml::from_str(source)?;
        compiler::compile(&document, base_dir, 0, &config)?.build()
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.get(name)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// All classes in definition order
    pub fn classes(&self) -> &IndexMap<String, Class> {
        &self.classes
    }

    /// Directive values other than includes, keyed without the marker
    pub fn options(&self) -> &IndexMap<String, Value> {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Seed requested by a `^seed` directive
    pub fn seed(&self) -> Option<u64> {
        match self.options.get("seed")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }
}

/// Accumulates classes and options while documents are compiled
///
/// The builder is passed by value through compilation and handed off as an
/// immutable [`Grammar`] by [`GrammarBuilder::build`], which validates all
/// class references.
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    classes: IndexMap<String, Class>,
    options: IndexMap<String, Value>,
    config: GrammarConfig,
}

impl GrammarBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        GrammarBuilder::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: GrammarConfig) -> Self {
        self.config = config;
        self
    }

    /// Define a class, replacing any earlier definition of the same name
    pub fn class(mut self, name: &str, class: Class) -> Self {
        self.insert_class(name.to_string(), class);
        self
    }

    /// Define a class from a simple expression such as `"$a + $b"`
    pub fn expression(self, name: &str, text: &str) -> Self {
        let class = compiler::compile_simple_expression(text).into();
        self.class(name, class)
    }

    /// Define a probabilistic choice from `(key, probability)` pairs
    ///
    /// The choice is compiled immediately with the current config, so
    /// call [`config`](Self::config) first when it changes `range_keys`.
    pub fn choice(self, name: &str, variants: &[(&str, &str)]) -> Result<Self> {
        let mut mapping = serde_yaml::Mapping::new();
        for (key, spec) in variants {
            mapping.insert(Value::from(*key), Value::from(*spec));
        }
        let choice = compiler::compile_choice(name, &mapping, &self.config)?;
        Ok(self.class(name, Class::Choice(choice)))
    }

    /// Store an option value
    pub fn option(mut self, name: &str, value: Value) -> Self {
        self.insert_option(name.to_string(), value);
        self
    }

    /// Merge another builder into this one. Classes and options from
    /// `other` override those in `self` with the same name.
    pub fn merge(&mut self, other: GrammarBuilder) {
        for (name, class) in other.classes {
            self.classes.insert(name, class);
        }
        for (name, value) in other.options {
            self.options.insert(name, value);
        }
    }

    pub(crate) fn insert_class(&mut self, name: String, class: Class) {
        self.classes.insert(name, class);
    }

    pub(crate) fn insert_option(&mut self, name: String, value: Value) {
        self.options.insert(name, value);
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn classes(&self) -> &IndexMap<String, Class> {
        &self.classes
    }

    pub fn options(&self) -> &IndexMap<String, Value> {
        &self.options
    }

    /// Validate class references and build the grammar
    pub fn build(self) -> Result<Grammar> {
        validate::validate(&self.classes)?;
        Ok(Grammar {
            classes: self.classes,
            options: self.options,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::GrammarError;

    #[test]
    fn test_builder_expression() {
        let grammar = GrammarBuilder::new()
            .expression("greeting", "Hello $subject")
            .expression("subject", "world")
            .build()
            .unwrap();

        assert_eq!(
            grammar.class("greeting"),
            Some(&Class::Expression(Expression {
                elements: vec![
                    Element::Literal("Hello".to_string()),
                    Element::ClassRef("subject".to_string()),
                ]
            }))
        );
        assert_eq!(
            grammar.class("subject"),
            Some(&Class::Literal("world".to_string()))
        );
    }

    #[test]
    fn test_builder_rejects_dangling_reference() {
        let result = GrammarBuilder::new().expression("a", "x $b").build();
        assert!(matches!(result, Err(GrammarError::UndefinedClass(name)) if name == "b"));
    }

    #[test]
    fn test_later_definition_wins() {
        let grammar = GrammarBuilder::new()
            .expression("shared", "first")
            .expression("other", "x")
            .expression("shared", "second")
            .build()
            .unwrap();

        assert_eq!(
            grammar.class("shared"),
            Some(&Class::Literal("second".to_string()))
        );
        // Overwriting keeps the original position.
        let names: Vec<&str> = grammar.classes().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["shared", "other"]);
    }

    #[test]
    fn test_merge_precedence() {
        let mut base = GrammarBuilder::new()
            .expression("shared", "base")
            .expression("base_only", "only in base");
        let overlay = GrammarBuilder::new()
            .expression("shared", "override")
            .option("seed", Value::from(7));

        base.merge(overlay);
        let grammar = base.build().unwrap();

        assert_eq!(
            grammar.class("shared"),
            Some(&Class::Literal("override".to_string()))
        );
        assert!(grammar.has_class("base_only"));
        assert_eq!(grammar.seed(), Some(7));
    }

    #[test]
    fn test_seed_from_string_option() {
        let grammar = GrammarBuilder::new()
            .option("seed", Value::from("42"))
            .build()
            .unwrap();
        assert_eq!(grammar.seed(), Some(42));

        let grammar = GrammarBuilder::new()
            .option("seed", Value::from("soon"))
            .build()
            .unwrap();
        assert_eq!(grammar.seed(), None);
    }

    #[test]
    fn test_builder_choice() {
        let grammar = GrammarBuilder::new()
            .choice("name", &[("Alice", "50%"), ("Bob", "auto")])
            .unwrap()
            .build()
            .unwrap();

        let Some(Class::Choice(choice)) = grammar.class("name") else {
            panic!("Expected Choice");
        };
        assert_eq!(choice.variations.len(), 2);
        assert_eq!(choice.total_weight(), 100.0);
    }

    #[test]
    fn test_choice_uses_config_set_before_it() {
        let always = GrammarConfig {
            range_keys: RangeKeys::Always,
            ..GrammarConfig::default()
        };
        let variations = |builder: GrammarBuilder| match builder.build().unwrap().class("pick") {
            Some(Class::Choice(choice)) => choice.variations.len(),
            other => panic!("Expected Choice, got {:?}", other),
        };

        let before = GrammarBuilder::new()
            .config(always.clone())
            .choice("pick", &[("ab", "auto")])
            .unwrap();
        assert_eq!(variations(before), 2);

        let after = GrammarBuilder::new()
            .choice("pick", &[("ab", "auto")])
            .unwrap()
            .config(always);
        assert_eq!(variations(after), 1);
    }

    #[test]
    fn test_config_from_yaml() {
        let config: GrammarConfig =
            serde_yaml::from_str("max_expansion_depth: 8\nrange_keys: always\n").unwrap();
        assert_eq!(config.max_expansion_depth, 8);
        assert_eq!(config.max_include_depth, 10);
        assert_eq!(config.range_keys, RangeKeys::Always);
    }
}
