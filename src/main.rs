use avatar_maker::{logger, ServerConfig};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = ServerConfig::from_env();
    logger::init_with_config(config.logger_config())?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }

    logger::log_startup_info("Avatar Maker Backend", env!("CARGO_PKG_VERSION"), &config);

    if let Err(e) = avatar_maker::server::run(config).await {
        log::error!("❌ Server stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}
