use crate::app::App;
use crate::calendar::MonthCursor;
use crate::config::Config;
use crate::gateway::{open_gateway, SharedGateway};
use crate::session::TutorSecret;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Why the app is stuck on the setup screen.
#[derive(Debug, Clone, Default)]
pub struct SetupStatus {
    pub missing: Vec<&'static str>,
    pub error: Option<String>,
}

pub struct AppState {
    pub setup: SetupStatus,
    pub app: Option<App>,
}

impl AppState {
    /// Opens the configured gateway and builds the app around it. Any
    /// failure lands on the setup screen instead of exiting.
    pub fn boot(config: &Config, month: MonthCursor) -> Self {
        let secret = TutorSecret::new(config.tutor_secret.clone());
        if !secret.is_configured() {
            tracing::warn!("no tutor secret configured; tutor login will always fail");
        }

        let Some(gateway_cfg) = config.gateway.as_ref() else {
            tracing::warn!(missing = ?config.missing, "gateway not configured");
            return Self {
                setup: SetupStatus {
                    missing: config.missing.clone(),
                    error: None,
                },
                app: None,
            };
        };

        match open_gateway(gateway_cfg) {
            Ok(gateway) => Self::with_gateway(gateway, secret, month),
            Err(e) => {
                tracing::error!(error = ?e, "failed to open gateway");
                Self {
                    setup: SetupStatus {
                        missing: Vec::new(),
                        error: Some(format!("{e:#}")),
                    },
                    app: None,
                }
            }
        }
    }

    pub fn with_gateway(gateway: SharedGateway, secret: TutorSecret, month: MonthCursor) -> Self {
        Self {
            setup: SetupStatus::default(),
            app: Some(App::new(gateway, Box::new(secret), month)),
        }
    }

    pub fn configured(&self) -> bool {
        self.app.is_some()
    }
}
