use std::error::Error;

use template_gen::{Evaluator, GrammarBuilder, GrammarConfig};

/// Example of creating a grammar programmatically
fn main() -> Result<(), Box<dyn Error>> {
    // Example 1: sentences
    let grammar = GrammarBuilder::new()
        .expression("sentence", "$subject $verb $object")
        .expression("subject", "The $adjective $noun")
        .expression("object", "the $adjective $noun")
        .choice("adjective", &[("quick", "auto"), ("lazy", "auto"), ("clever", "auto")])?
        .choice("noun", &[("fox", "50%"), ("dog", "30%"), ("programmer", "auto")])?
        .choice("verb", &[("jumps", "auto"), ("observes", "auto")])?
        .build()?;

    let mut evaluator = Evaluator::from_seed(&grammar, 1);
    println!("Generated sentences:");
    for i in 1..=5 {
        println!("{}. {}", i, evaluator.eval_class("sentence")?.join(" "));
    }

    // Example 2: a recursive arithmetic grammar with a small depth limit
    let config = GrammarConfig {
        max_expansion_depth: 12,
        ..GrammarConfig::default()
    };
    let code_grammar = GrammarBuilder::new()
        .config(config)
        .choice(
            "expression",
            &[("$term + $expression", "25%"), ("$term - $expression", "15%"), ("$term", "auto")],
        )?
        .choice("term", &[("$factor * $factor", "30%"), ("$factor", "auto")])?
        .choice("factor", &[("$number", "60%"), ("$variable", "30%"), ("( $expression )", "auto")])?
        .choice("number", &[("0-9", "auto")])?
        .choice("variable", &[("x-z", "auto")])?
        .build()?;

    let mut evaluator = Evaluator::from_seed(&code_grammar, 7);
    println!("\nGenerated expressions:");
    for i in 1..=5 {
        match evaluator.eval_class("expression") {
            Ok(tokens) => println!("{}. {}", i, tokens.join(" ")),
            Err(err) => println!("{}. <{}>", i, err),
        }
    }

    Ok(())
}
