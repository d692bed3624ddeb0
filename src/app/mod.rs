use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{config::AppConfig, web::cors::CorsPolicy, MailerClient, Result};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}

impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let mailer_config = &config.mailer_config;
        let api_key = mailer_config.api_key();
        if api_key.is_none() {
            warn!(
                "{:<20} - subscribe requests will fail until it is set",
                "API key missing:"
            );
        }

        let mailer_client = MailerClient::new(
            &mailer_config.base_url,
            mailer_config.group_id.clone(),
            api_key,
            mailer_config.timeout(),
        )?;
        let cors = CorsPolicy::from(&config.cors_config);

        let app_state = AppState::new(mailer_client, cors);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

pub struct InternalState {
    pub mailer_client: MailerClient,
    pub cors: CorsPolicy,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(mailer_client: MailerClient, cors: CorsPolicy) -> Self {
        AppState(Arc::new(InternalState {
            mailer_client,
            cors,
        }))
    }
}
