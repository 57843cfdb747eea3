use std::path::Path;

use clap::{Args, Subcommand};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{AppConfig, OAuthGrant, UpstreamAuth};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked).
    Show,
    /// Validate the configuration and report the authentication mode.
    Check,
}

pub fn run(command: ConfigCommand, path: &Path) -> AppResult<()> {
    let config = AppConfig::load(path)?;
    match command {
        ConfigCommand::Show => {
            println!("Configuration file: {}", path.display());
            print!("{}", render(&config));
        }
        ConfigCommand::Check => {
            println!(
                "Configuration OK: {} using {}",
                config.servicenow.instance_url,
                config.servicenow.auth.describe()
            );
            if config.backstage.is_none() {
                println!("Note: backstage.baseUrl is not set; `serve` will refuse to start.");
            }
        }
    }
    Ok(())
}

fn render(config: &AppConfig) -> String {
    let sn = &config.servicenow;
    let mut lines = vec![
        format!("ServiceNow instance URL: {}", sn.instance_url),
        format!("User filter field: {}", sn.user_filter_field),
        format!("Authentication: {}", sn.auth.describe()),
    ];

    match &sn.auth {
        UpstreamAuth::OAuth(oauth) => {
            lines.push(format!("OAuth token URL: {}", oauth.token_url));
            lines.push(format!("OAuth client ID: {}", oauth.client_id));
            lines.push(format!(
                "OAuth client secret: {}",
                mask_secret(Some(&oauth.client_secret))
            ));
            if let OAuthGrant::Password { username, password } = &oauth.grant {
                lines.push(format!("OAuth username: {username}"));
                lines.push(format!("OAuth password: {}", mask_secret(Some(password))));
            }
        }
        UpstreamAuth::Basic(basic) => {
            lines.push(format!("Basic auth username: {}", basic.username));
            lines.push(format!(
                "Basic auth password: {}",
                mask_secret(Some(&basic.password))
            ));
        }
    }

    lines.push(format!("Listen address: {}", config.server.socket_addr()));
    lines.push(format!(
        "Backstage URL: {}",
        display_value(config.backstage.as_ref().map(|b| b.base_url.as_str()))
    ));
    lines.push(format!(
        "Backstage token: {}",
        mask_secret(config.backstage.as_ref().and_then(|b| b.token.as_ref()))
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn display_value(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: Option<&SecretString>) -> String {
    match value.map(|secret| secret.expose_secret()) {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secrets() {
        let long = SecretString::from("abcdef123456".to_string());
        assert_eq!(mask_secret(Some(&long)), "abc***456");

        let short = SecretString::from("abc".to_string());
        assert_eq!(mask_secret(Some(&short)), "***");

        assert_eq!(mask_secret(None), "<not set>");
    }

    #[test]
    fn renders_without_leaking_secrets() {
        let contents = r#"
            [servicenow]
            instanceUrl = "https://acme.service-now.com"

            [servicenow.oauth]
            grantType = "password"
            clientId = "client-id"
            clientSecret = "super-secret-value"
            username = "integration"
            password = "hunter22"
        "#;
        let config = AppConfig::from_sources(Some(contents), |_| None).unwrap();

        let rendered = render(&config);
        assert!(rendered.contains("OAuth client secret: sup***lue"));
        assert!(rendered.contains("OAuth password: hun***r22"));
        assert!(rendered.contains("Backstage URL: <not set>"));
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("hunter22"));
    }
}
