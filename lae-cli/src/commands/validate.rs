use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use lae_engine::TreeParser;

/// Check an operation tree document without running it
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the operation tree document (.json, .yaml or .yml)
    pub input: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    let input_path = &args.input;

    // Step 1: Parse document syntax, operators and arity
    output::status("Validating", &format!("{}", input_path.display()));

    let tree = match TreeParser::parse_file(input_path) {
        Ok(tree) => tree,
        Err(e) => {
            output::error(&format!("Parse error: {}", e));
            std::process::exit(1);
        }
    };

    output::check("Document syntax valid");
    output::check(&format!(
        "Structure: {} operators, depth {}",
        tree.count_operators(),
        tree.depth()
    ));

    // Step 2: Shapes
    match tree.infer_shape() {
        Ok((rows, columns)) => {
            output::check(&format!("Result shape: {}x{}", rows, columns));
        }
        Err(e) => {
            output::error(&format!("Shape error: {}", e));
            std::process::exit(1);
        }
    }

    eprintln!();
    output::success("Operation tree is valid");

    Ok(())
}
