//! Configuration loaded from a TOML file with `SNOWDESK_*` environment
//! overrides.
//!
//! ```toml
//! [servicenow]
//! instanceUrl = "https://acme.service-now.com"
//! userFilterField = "caller_id"
//!
//! [servicenow.oauth]
//! grantType = "client_credentials"
//! clientId = "..."
//! clientSecret = "..."
//!
//! [backstage]
//! baseUrl = "http://localhost:7007"
//! token = "..."
//! ```

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use reqwest::Url;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

const DEFAULT_PORT: u16 = 7007;
const DEFAULT_USER_FILTER_FIELD: &str = "caller_id";
const TOKEN_PATH: &str = "oauth_token.do";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub servicenow: ServiceNowConfig,
    pub server: ServerConfig,
    pub backstage: Option<BackstageConfig>,
}

#[derive(Debug, Clone)]
pub struct ServiceNowConfig {
    /// Instance base URL without a trailing slash.
    pub instance_url: String,
    pub auth: UpstreamAuth,
    pub user_filter_field: String,
}

#[derive(Debug, Clone)]
pub enum UpstreamAuth {
    OAuth(OAuthConfig),
    Basic(BasicAuthConfig),
}

impl UpstreamAuth {
    pub fn describe(&self) -> &'static str {
        match self {
            UpstreamAuth::OAuth(oauth) => match oauth.grant {
                OAuthGrant::ClientCredentials => "OAuth2 client credentials",
                OAuthGrant::Password { .. } => "OAuth2 resource owner password",
            },
            UpstreamAuth::Basic(_) => "basic auth",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub grant: OAuthGrant,
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
}

#[derive(Debug, Clone)]
pub enum OAuthGrant {
    ClientCredentials,
    Password {
        username: String,
        password: SecretString,
    },
}

impl OAuthGrant {
    pub fn grant_type(&self) -> &'static str {
        match self {
            OAuthGrant::ClientCredentials => "client_credentials",
            OAuthGrant::Password { .. } => "password",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

/// Catalog backend the proxy consults for caller identity and user entities.
#[derive(Debug, Clone)]
pub struct BackstageConfig {
    pub base_url: String,
    /// Service token presented to the catalog; requests fail with 401 without it.
    pub token: Option<SecretString>,
}

impl AppConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using environment only");
                None
            }
            Err(err) => return Err(AppError::Io(err)),
        };

        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(contents: Option<&str>, env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw = match contents {
            Some(contents) => toml::from_str::<RawConfig>(contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}")))?,
            None => RawConfig::default(),
        };
        raw.apply_env(env)?;
        raw.validate()
    }

    pub fn backstage(&self) -> AppResult<&BackstageConfig> {
        self.backstage
            .as_ref()
            .ok_or_else(|| missing("backstage.baseUrl"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    servicenow: RawServiceNow,
    server: RawServer,
    backstage: RawBackstage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawServiceNow {
    instance_url: Option<String>,
    oauth: Option<RawOAuth>,
    basic_auth: Option<RawBasicAuth>,
    user_filter_field: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOAuth {
    grant_type: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBasicAuth {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawBackstage {
    base_url: Option<String>,
    token: Option<String>,
}

impl RawConfig {
    fn apply_env<F>(&mut self, env: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sn = &mut self.servicenow;
        override_with(&mut sn.instance_url, env("SNOWDESK_INSTANCE_URL"));
        override_with(&mut sn.user_filter_field, env("SNOWDESK_USER_FILTER_FIELD"));

        let oauth_keys = [
            "SNOWDESK_OAUTH_GRANT_TYPE",
            "SNOWDESK_OAUTH_CLIENT_ID",
            "SNOWDESK_OAUTH_CLIENT_SECRET",
            "SNOWDESK_OAUTH_TOKEN_URL",
            "SNOWDESK_OAUTH_USERNAME",
            "SNOWDESK_OAUTH_PASSWORD",
        ];
        let [grant_type, client_id, client_secret, token_url, username, password] =
            oauth_keys.map(|key| env(key));
        if sn.oauth.is_some() || client_id.is_some() || client_secret.is_some() {
            let oauth = sn.oauth.get_or_insert_with(RawOAuth::default);
            override_with(&mut oauth.grant_type, grant_type);
            override_with(&mut oauth.client_id, client_id);
            override_with(&mut oauth.client_secret, client_secret);
            override_with(&mut oauth.token_url, token_url);
            override_with(&mut oauth.username, username);
            override_with(&mut oauth.password, password);
        }

        let basic_username = env("SNOWDESK_BASIC_USERNAME");
        let basic_password = env("SNOWDESK_BASIC_PASSWORD");
        if sn.basic_auth.is_some() || basic_username.is_some() {
            let basic = sn.basic_auth.get_or_insert_with(RawBasicAuth::default);
            override_with(&mut basic.username, basic_username);
            override_with(&mut basic.password, basic_password);
        }

        override_with(&mut self.server.host, env("SNOWDESK_HOST"));
        if let Some(port) = env("SNOWDESK_PORT") {
            let parsed = port.trim().parse().map_err(|_| {
                AppError::Configuration(format!("Invalid value at SNOWDESK_PORT: {port}"))
            })?;
            self.server.port = Some(parsed);
        }

        override_with(&mut self.backstage.base_url, env("SNOWDESK_BACKSTAGE_URL"));
        override_with(&mut self.backstage.token, env("SNOWDESK_BACKSTAGE_TOKEN"));
        Ok(())
    }

    fn validate(self) -> AppResult<AppConfig> {
        let servicenow = self.servicenow.validate()?;

        let server = ServerConfig {
            host: match non_empty(self.server.host) {
                Some(host) => host.parse().map_err(|_| {
                    AppError::Configuration(format!("invalid server.host: {host}"))
                })?,
                None => ServerConfig::default().host,
            },
            port: self.server.port.unwrap_or(DEFAULT_PORT),
        };

        let backstage = match non_empty(self.backstage.base_url) {
            Some(base_url) => Some(BackstageConfig {
                base_url: normalize_url(&base_url, "backstage.baseUrl")?,
                token: non_empty(self.backstage.token).map(SecretString::from),
            }),
            None => None,
        };

        Ok(AppConfig {
            servicenow,
            server,
            backstage,
        })
    }
}

impl RawServiceNow {
    fn validate(self) -> AppResult<ServiceNowConfig> {
        let instance_url = non_empty(self.instance_url)
            .ok_or_else(|| missing("servicenow.instanceUrl"))?;
        let instance_url = normalize_url(&instance_url, "servicenow.instanceUrl")?;

        let auth = match (self.oauth, self.basic_auth) {
            (Some(oauth), _) => UpstreamAuth::OAuth(oauth.validate(&instance_url)?),
            (None, Some(basic)) => UpstreamAuth::Basic(BasicAuthConfig {
                username: required(basic.username, "servicenow.basicAuth.username")?,
                password: SecretString::from(required(
                    basic.password,
                    "servicenow.basicAuth.password",
                )?),
            }),
            (None, None) => {
                return Err(AppError::Configuration(
                    "Missing ServiceNow credentials: configure servicenow.oauth or servicenow.basicAuth"
                        .to_string(),
                ));
            }
        };

        Ok(ServiceNowConfig {
            instance_url,
            auth,
            user_filter_field: non_empty(self.user_filter_field)
                .unwrap_or_else(|| DEFAULT_USER_FILTER_FIELD.to_string()),
        })
    }
}

impl RawOAuth {
    fn validate(self, instance_url: &str) -> AppResult<OAuthConfig> {
        let grant_type = required(self.grant_type, "servicenow.oauth.grantType")?;
        let client_id = required(self.client_id, "servicenow.oauth.clientId")?;
        let client_secret = required(self.client_secret, "servicenow.oauth.clientSecret")?;

        let grant = match grant_type.as_str() {
            "client_credentials" => OAuthGrant::ClientCredentials,
            "password" => OAuthGrant::Password {
                username: required(self.username, "servicenow.oauth.username")?,
                password: SecretString::from(required(
                    self.password,
                    "servicenow.oauth.password",
                )?),
            },
            other => {
                return Err(AppError::Configuration(format!(
                    "Invalid value at servicenow.oauth.grantType: '{other}' (expected 'client_credentials' or 'password')"
                )));
            }
        };

        let token_url = match non_empty(self.token_url) {
            Some(url) => {
                Url::parse(&url).map_err(|err| {
                    AppError::Configuration(format!(
                        "Invalid URL at servicenow.oauth.tokenUrl: {err}"
                    ))
                })?;
                url
            }
            None => format!("{instance_url}/{TOKEN_PATH}"),
        };

        Ok(OAuthConfig {
            grant,
            client_id,
            client_secret: SecretString::from(client_secret),
            token_url,
        })
    }
}

fn override_with(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = Some(value);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, key: &str) -> AppResult<String> {
    non_empty(value).ok_or_else(|| missing(key))
}

fn missing(key: &str) -> AppError {
    AppError::Configuration(format!("Missing required config value at {key}"))
}

fn normalize_url(value: &str, key: &str) -> AppResult<String> {
    Url::parse(value)
        .map_err(|err| AppError::Configuration(format!("Invalid URL at {key}: {err}")))?;
    Ok(value.trim_end_matches('/').to_string())
}
