pub const ENV_GATEWAY_URL: &str = "ATTENDANCE_GATEWAY_URL";
pub const ENV_GATEWAY_KEY: &str = "ATTENDANCE_GATEWAY_KEY";
pub const ENV_TUTOR_CODE: &str = "ATTENDANCE_TUTOR_CODE";
pub const ENV_TUTOR_CODE_SHA256: &str = "ATTENDANCE_TUTOR_CODE_SHA256";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorSecretConfig {
    Plain(String),
    Sha256Hex(String),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gateway: Option<GatewayConfig>,
    pub tutor_secret: Option<TutorSecretConfig>,
    pub missing: Vec<&'static str>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get(ENV_GATEWAY_URL);
        let api_key = get(ENV_GATEWAY_KEY);
        let mut missing = Vec::new();
        if url.is_none() {
            missing.push(ENV_GATEWAY_URL);
        }
        if api_key.is_none() {
            missing.push(ENV_GATEWAY_KEY);
        }
        let gateway = match (url, api_key) {
            (Some(url), Some(api_key)) => Some(GatewayConfig { url, api_key }),
            _ => None,
        };

        let tutor_secret = get(ENV_TUTOR_CODE_SHA256)
            .map(|h| TutorSecretConfig::Sha256Hex(h.trim().to_ascii_lowercase()))
            .or_else(|| get(ENV_TUTOR_CODE).map(TutorSecretConfig::Plain));

        Self {
            gateway,
            tutor_secret,
            missing,
        }
    }
}
