//! `validate` command implementation.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::cli::ValidateArgs;

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = config_loader::ConfigLoader::load_from_path(&args.config);

    if args.json {
        let output = match &result {
            Ok(_) => json!({ "valid": true, "config": args.config.display().to_string() }),
            Err(e) => json!({
                "valid": false,
                "config": args.config.display().to_string(),
                "error": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &result {
            Ok(_) => println!("Configuration is valid: {}", args.config.display()),
            Err(e) => println!("Configuration is invalid: {e}"),
        }
    }

    match result {
        Ok(_) => {
            info!(config = %args.config.display(), "Validation succeeded");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
