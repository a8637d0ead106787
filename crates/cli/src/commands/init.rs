//! `shepherd init` — First-time setup.

use shepherd_config::AppConfig;
use shepherd_store::SqliteStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Shepherd — First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    } else {
        println!("Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or delete and re-run init.");
    } else {
        let default_toml = AppConfig::default_toml();
        std::fs::write(&config_path, &default_toml)?;
        println!("Created config.toml at: {}", config_path.display());
    }

    // Opening the store runs migrations and seeds the default template.
    let config = AppConfig::load()?;
    SqliteStore::new(&config.store.path).await?;
    println!("Database ready at: {}", config.store.path);

    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY (or api_key in config.toml)");
    println!("  2. Load knowledge entries: shepherd kb add ...");
    println!("  3. Compute embeddings:     shepherd kb index");
    println!("  4. Start the gateway:      shepherd serve");

    Ok(())
}
