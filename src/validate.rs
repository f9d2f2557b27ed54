//! Reference checks over a fully merged class table.

use indexmap::IndexMap;

use crate::grammar::{Class, Content, Element, Expression};
use crate::utils::{GrammarError, Result};

/// Check that every class reference names an existing class.
///
/// Reference cycles are not detected here; the evaluator bounds expansion
/// depth instead.
pub fn validate(classes: &IndexMap<String, Class>) -> Result<()> {
    for class in classes.values() {
        match class {
            Class::Literal(_) => {}
            Class::Expression(expr) => check_expression(expr, classes)?,
            Class::Choice(choice) => {
                for variation in &choice.variations {
                    if let Content::Expression(expr) = &variation.content {
                        check_expression(expr, classes)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_expression(expr: &Expression, classes: &IndexMap<String, Class>) -> Result<()> {
    for element in &expr.elements {
        if let Element::ClassRef(name) = element {
            if !classes.contains_key(name) {
                return Err(GrammarError::UndefinedClass(name.clone()));
            }
        }
    }
    Ok(())
}
