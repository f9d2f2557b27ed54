//! Template-Gen compiles probabilistic template grammars and expands them
//! into random token sequences.
//!
//! A grammar is a YAML mapping of classes. A string class is an expression
//! whose `$name` tokens refer to other classes; a mapping class picks one of
//! its keys with the given percentage; a list class picks uniformly.
//!
//! # Example
//!
//! ```rust
//! use template_gen::{Evaluator, Grammar};
//!
//! let grammar = Grammar::from_yaml_str(
//!     r#"
//!     greeting: "$name !"
//!     name: { Alice: 50%, Bob: auto }
//!     "#,
//!     None,
//! )
//! .unwrap();
//!
//! let mut evaluator = Evaluator::from_seed(&grammar, 42);
//! let tokens = evaluator.eval_class("greeting").unwrap();
//! assert_eq!(tokens.len(), 2);
//! assert!(tokens[0] == "Alice" || tokens[0] == "Bob");
//! ```

pub mod compiler;
pub mod evaluator;
pub mod grammar;
pub mod range;
pub mod utils;
pub mod validate;

pub use evaluator::{Evaluator, Expansion};
pub use grammar::{Grammar, GrammarBuilder, GrammarConfig, RangeKeys};
pub use utils::{ErrorKind, GrammarError, Result};

// Re-export the AST
pub use grammar::{Class, Content, Element, Expression, ProbabilisticChoice, Variation};
