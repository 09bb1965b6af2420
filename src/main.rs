use std::net::TcpListener;

use chirpy::auth::{PasswordHasher, TokenService};
use chirpy::configuration::get_configuration;
use chirpy::database::Database;
use chirpy::startup::run;
use chirpy::telemetry::{get_subscriber, init_telemetry};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry(get_subscriber("info"));

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let tokens = TokenService::new(&configuration.jwt).map_err(|e| {
        tracing::error!("Invalid JWT settings: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;

    let hasher = PasswordHasher::new(configuration.database.bcrypt_cost);
    let db = Database::open(&configuration.database.path, hasher).map_err(|e| {
        tracing::error!("Failed to open document store: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Document store error")
    })?;

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        db,
        tokens,
        configuration.polka.clone(),
        configuration.application.static_root.clone(),
    )?;
    tracing::info!("Server started successfully");

    server.await
}
