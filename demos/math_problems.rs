use std::error::Error;
use std::path::Path;

use template_gen::{Evaluator, Grammar};

/// Generates equations from the bundled math templates
fn main() -> Result<(), Box<dyn Error>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/templates/example.yaml");
    let grammar = Grammar::from_file(&path)?;

    // Seeded from the template's ^seed directive.
    let mut evaluator = Evaluator::new(&grammar);

    println!("Quadratic equations:");
    for i in 1..=15 {
        println!("{}. {}", i, evaluator.eval_class("quad_equation")?.join(" "));
    }

    println!("\nLinear equations (tokens):");
    for i in 1..=5 {
        println!("{}. {:?}", i, evaluator.eval_class("linear_equation")?);
    }

    Ok(())
}
