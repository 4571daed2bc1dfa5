//! `finpilot onboard` — First-time setup.

use finpilot_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("💰 FinPilot — First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Add your API key to {} (or set GEMINI_API_KEY)", config_path.display());
        println!("   2. Run: finpilot import --user <you> records.json");
        println!("   3. Run: finpilot dashboard --user <you>\n");
    }

    // Opening the store creates the database file and runs migrations.
    let config = super::load_config()?;
    super::open_store(&config).await?;
    println!("✅ Record store ready: {}", config.store.path.display());

    println!("\n🎉 Setup complete! Run `finpilot ask --user <you>` to talk to FinPilot.\n");

    Ok(())
}
