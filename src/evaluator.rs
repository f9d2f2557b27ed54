use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::trace;

use crate::grammar::{Class, Content, Element, Expression, Grammar, ProbabilisticChoice};
use crate::utils::{GrammarError, Result};

/// The result of expanding a class before flattening
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Expansion {
    /// A single literal token
    Leaf(String),
    /// The ordered expansion of an expression; nested classes stay nested
    Sequence(Vec<Expansion>),
}

impl Expansion {
    /// Depth-first flatten into tokens, preserving left-to-right order
    pub fn flatten(self) -> Vec<String> {
        let mut tokens = Vec::new();
        self.flatten_into(&mut tokens);
        tokens
    }

    fn flatten_into(self, tokens: &mut Vec<String>) {
        match self {
            Expansion::Leaf(token) => tokens.push(token),
            Expansion::Sequence(items) => {
                for item in items {
                    item.flatten_into(tokens);
                }
            }
        }
    }
}

/// Expands classes of a grammar into token sequences
///
/// The evaluator only reads the grammar; its sole state is the random
/// source, so two evaluators seeded alike produce identical output.
pub struct Evaluator<'g, R = StdRng> {
    grammar: &'g Grammar,
    rng: R,
}

impl<'g> Evaluator<'g, StdRng> {
    /// Seeded from the grammar's `^seed` option, or from entropy without one
    pub fn new(grammar: &'g Grammar) -> Self {
        let rng = match grammar.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Evaluator { grammar, rng }
    }

    pub fn from_seed(grammar: &'g Grammar, seed: u64) -> Self {
        Evaluator {
            grammar,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<'g, R: Rng> Evaluator<'g, R> {
    pub fn with_rng(grammar: &'g Grammar, rng: R) -> Self {
        Evaluator { grammar, rng }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Expand a class into a flat sequence of tokens
    pub fn eval_class(&mut self, name: &str) -> Result<Vec<String>> {
        Ok(self.expand_class(name)?.flatten())
    }

    /// Expand a class, keeping the nesting of referenced classes
    pub fn expand_class(&mut self, name: &str) -> Result<Expansion> {
        self.expand_named(name, 0)
    }

    /// Expand a class and join its tokens without separators
    pub fn generate(&mut self, name: &str) -> Result<String> {
        Ok(self.eval_class(name)?.concat())
    }

    fn expand_named(&mut self, name: &str, depth: usize) -> Result<Expansion> {
        let grammar = self.grammar;
        let limit = grammar.config().max_expansion_depth;
        if depth >= limit {
            return Err(GrammarError::RecursionLimit {
                class: name.to_string(),
                limit,
            });
        }

        let class = grammar
            .class(name)
            .ok_or_else(|| GrammarError::UnknownClass(name.to_string()))?;
        trace!(class = name, depth, "expanding class");

        match class {
            Class::Literal(text) => Ok(Expansion::Leaf(text.clone())),
            Class::Expression(expr) => self.expand_expression(expr, depth),
            Class::Choice(choice) => match self.choose(name, choice)? {
                Content::Literal(text) => Ok(Expansion::Leaf(text.clone())),
                Content::Expression(expr) => self.expand_expression(expr, depth),
            },
        }
    }

    fn expand_expression(&mut self, expr: &Expression, depth: usize) -> Result<Expansion> {
        let mut items = Vec::with_capacity(expr.elements.len());
        for element in &expr.elements {
            let item = match element {
                Element::Literal(text) => Expansion::Leaf(text.clone()),
                Element::ClassRef(name) => self.expand_named(name, depth + 1)?,
            };
            items.push(item);
        }
        Ok(Expansion::Sequence(items))
    }

    fn choose<'c>(&mut self, class: &str, choice: &'c ProbabilisticChoice) -> Result<&'c Content> {
        let weights = choice.variations.iter().map(|v| v.weight);
        let dist = WeightedIndex::<f64>::new(weights).map_err(|_| {
            GrammarError::EmptyChoice {
                class: class.to_string(),
            }
        })?;
        let index = dist.sample(&mut self.rng);
        trace!(class, index, "selected variation");
        Ok(&choice.variations[index].content)
    }
}
