use std::sync::Arc;

use jotter_core::NotesService;

use crate::backend::UrlConnector;
use crate::config::Config;

pub type Service = NotesService<UrlConnector>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Service>,
}

impl AppState {
    /// Build the state without touching the store; the connection opens on first request.
    pub fn new(config: &Config) -> Self {
        let connector = UrlConnector::new(config.storage.database_url.clone());
        let service = NotesService::with_settings(connector, config.service_settings());

        Self {
            service: Arc::new(service),
        }
    }
}
