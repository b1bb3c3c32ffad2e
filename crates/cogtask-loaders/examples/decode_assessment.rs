//! Decode example — inspect an assessment document.
//!
//! Decodes a tagged JSON document, prints the step table, and reports any
//! validation warnings.
//!
//! ```bash
//! cargo run --example decode_assessment -- path/to/assessment.json
//! ```

use std::env;

use cogtask_core::decode::{load_assessment, validate_assessment};
use cogtask_core::model::Step;
use cogtask_core::traits::Node;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cogtask=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .expect("Usage: decode_assessment <assessment.json>");

    let assessment = load_assessment(path.as_ref())?;
    println!(
        "{} (version {}, ~{} min, {:?})",
        assessment.identifier,
        assessment.version_string.as_deref().unwrap_or("unversioned"),
        assessment.estimated_minutes,
        assessment.task_orientation
    );

    println!("\n{:<4} {:<24} {:<12} {:<8}", "#", "Identifier", "Kind", "Label");
    println!("{}", "-".repeat(52));
    for (index, step) in assessment.steps.iter().enumerate() {
        let kind = match step {
            Step::Instruction(_) => "instruction",
            Step::Form(_) => "form",
        };
        let label = assessment
            .sequence_number(index)
            .or_else(|| assessment.sequence_letter(index))
            .unwrap_or("-");
        println!(
            "{:<4} {:<24} {:<12} {:<8}",
            index + 1,
            step.identifier(),
            kind,
            label
        );
    }

    let warnings = validate_assessment(&assessment);
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            match &warning.node_id {
                Some(node) => println!("  [{node}] {}", warning.message),
                None => println!("  {}", warning.message),
            }
        }
    }

    Ok(())
}
