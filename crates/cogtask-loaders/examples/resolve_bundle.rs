//! Resolution example — resolve an assessment against a resource directory.
//!
//! Decodes a document, resolves it with a file-system loader, and creates a
//! fresh result record for the run.
//!
//! ```bash
//! cargo run --example resolve_bundle -- assessment.json resources/ org.example.main
//! ```

use std::env;

use cogtask_core::decode::load_assessment;
use cogtask_core::resolve::resolve_assessment;
use cogtask_core::traits::{Node, ResourceContext};
use cogtask_loaders::FileSystemLoader;

const USAGE: &str = "Usage: resolve_bundle <assessment.json> <resource-dir> [bundle]";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cogtask=debug".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let document = args.get(1).expect(USAGE);
    let resource_dir = args.get(2).expect(USAGE);
    let bundle = args.get(3).map(String::as_str).unwrap_or("main");

    let assessment = load_assessment(document.as_ref())?;
    let loader = FileSystemLoader::new(resource_dir.as_str());
    let context = ResourceContext::new(bundle, "en");

    let resolved = resolve_assessment(&assessment, &loader, &context)?;
    println!("resolved `{}` against {resource_dir}", resolved.identifier);
    for step in &resolved.steps {
        let image = match step.image() {
            Some(info) if info.is_bound() => format!("image `{}` bound", info.image_name),
            Some(info) => format!("image `{}` unbound", info.image_name),
            None => "no image".to_string(),
        };
        println!("  {:<24} {image}", step.identifier());
    }

    let result = resolved.create_result();
    println!(
        "\ncreated result `{}` (run {}) at {}",
        result.identifier, result.run_id, result.started_at
    );

    Ok(())
}
