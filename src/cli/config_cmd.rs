use anyhow::Result;

use crate::core::config::AppConfig;
use crate::core::process::which;

pub fn init() -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    match AppConfig::default().save() {
        Ok(path) => println!("Generated config at {}", path.display()),
        Err(e) => {
            eprintln!("Failed to generate config: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

pub fn check() -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `ccview config init` to create one.");
    }

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let mut issues = config.validate();
    let program = &config.collaborator.program;
    let resolved = which(program);
    if resolved.is_none() {
        issues.push(format!("Program '{}' not found in PATH", program));
    }

    if issues.is_empty() {
        if path.exists() {
            println!("Config is valid: {}", path.display());
        }
        if let Some(resolved) = resolved {
            println!(
                "  Collaborator: {} {}",
                resolved.display(),
                config.collaborator.args.join(" ")
            );
        }
        if let Some(dir) = &config.collaborator.working_dir {
            println!("  Working directory: {}", dir.display());
        }
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        std::process::exit(1);
    }
    Ok(())
}
