//! `finpilot doctor` — Diagnose config, credentials and the record store.

use finpilot_config::AppConfig;
use finpilot_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 FinPilot Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `finpilot onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the config file and re-run doctor.");
            return Ok(());
        }
    };
    println!("     Provider: {} ({})", config.provider, config.model);

    match finpilot_providers::build_from_config(&config) {
        Ok(resolved) => {
            println!("  ✅ Provider credentials present");
            match resolved.provider.health_check().await {
                Ok(true) => println!("  ✅ Provider reachable"),
                Ok(false) => {
                    println!("  ⚠️  Provider answered but reported unhealthy");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider unreachable: {e}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ {e} — set GEMINI_API_KEY or add api_key to config.toml");
            issues += 1;
        }
    }

    let store_path = config.store.path.to_string_lossy();
    match SqliteStore::open(&store_path).await {
        Ok(_) => println!("  ✅ Record store opens: {}", config.store.path.display()),
        Err(e) => {
            println!("  ❌ Record store unusable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
