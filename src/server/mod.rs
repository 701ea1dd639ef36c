pub mod relay;

use axum::Router;
use log::{ error, info, warn };
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::{ ServeDir, ServeFile };

use crate::cli::ServeArgs;
use self::relay::RelayState;

/// Relay routes under `/api/llm`, everything else served from `static_dir`
/// with `index.html` as the fallback for client-side routes.
pub fn build_app(state: RelayState, static_dir: &str) -> Router {
    let index = Path::new(static_dir).join("index.html");
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(index));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/llm", relay::router(state))
        .fallback_service(spa)
        .layer(cors)
}

/// Resolves `host` the way the OS does, so names like `localhost` work as well as
/// literal addresses. Takes the first address returned.
pub async fn resolve_addr(host: &str, port: u16) -> io::Result<SocketAddr> {
    tokio::net
        ::lookup_host((host, port)).await?
        .next()
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no address found for host '{}'", host))
        })
}

pub struct Server {
    args: ServeArgs,
}

impl Server {
    pub fn new(args: ServeArgs) -> Self {
        Self { args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = resolve_addr(&self.args.host, self.args.port).await.map_err(|e| {
            error!("Cannot resolve listen address {}:{}: {}", self.args.host, self.args.port, e);
            e
        })?;

        if !Path::new(&self.args.static_dir).is_dir() {
            warn!(
                "Static directory '{}' not found; only the /api/llm routes will respond.",
                self.args.static_dir
            );
        }

        let state = RelayState::new(self.args.relay_config());
        let app = build_app(state, &self.args.static_dir);

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };

            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            info!("Server running on https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                e
            })?;

            info!("Server running on http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
