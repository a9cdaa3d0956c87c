use dreamrelay::{logger, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init()?;

    if dotenv_loaded {
        log::info!(".env file loaded");
    } else {
        log::warn!("No .env file found, using system environment variables");
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = dreamrelay::server::serve(config).await {
        log::error!("Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
