use std::fs;

use crate::cli::commands::InitArgs;
use crate::io::workspace::{self, WORKSPACE_DIR};

const CONFIG_TEMPLATE: &str = include_str!("../../templates/config.toml");

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let dir = cwd.join(WORKSPACE_DIR);

    if dir.join("config.toml").exists() && !args.force {
        return Err("tickwatch workspace already exists in ./tickwatch/ (use --force to overwrite the config)".into());
    }

    // Warn when nesting under an existing workspace
    if let Some(parent) = cwd.parent()
        && let Ok(parent_root) = workspace::discover_workspace(parent)
    {
        eprintln!(
            "Note: parent workspace found at {}/",
            parent_root.join(WORKSPACE_DIR).display()
        );
        eprintln!("Creating new workspace in ./tickwatch/");
    }

    fs::create_dir_all(&dir)?;
    fs::write(dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized tickwatch workspace in ./tickwatch/");
    println!("  next: set api_key in tickwatch/config.toml, then add a feed:");
    println!("        tw feeds add \"My feed\" https://redmine.example.com/issues.atom");

    Ok(())
}
