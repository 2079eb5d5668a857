//! `deskpilot onboard`: first-time setup.

use deskpilot_config::AppConfig;

use super::CmdResult;

pub async fn run() -> CmdResult {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("DeskPilot: First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete it and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("  Created config.toml at: {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Set ANTHROPIC_API_KEY (and OPENAI_API_KEY for narration)");
    println!("  2. Grant your terminal Screen Recording and Accessibility access");
    println!("  3. Install cliclick: brew install cliclick");
    println!("  4. Run: deskpilot run --task \"open TextEdit and write a haiku\"\n");

    Ok(())
}
