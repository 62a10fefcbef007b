//! Command-line interface.
//!
//! A thin shell over [`Session`](crate::session::Session) for poking at a
//! backend by hand:
//!
//! ```ignore
//! use sessionlink::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args());
//! run_cli_command(command, Session::builder(config), &mut std::io::stdout()).await?;
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use version::{version_line, VERSION};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use serde_json::Value;
use std::io::Write;

use crate::auth::Credential;
use crate::error::SessionError;
use crate::pipeline::RequestOptions;
use crate::session::SessionBuilder;

/// Run a parsed command, writing its output to `out`.
pub async fn run_cli_command<W: Write>(
    command: CliCommand,
    builder: SessionBuilder,
    out: &mut W,
) -> Result<()> {
    match command {
        CliCommand::Version => writeln!(out, "{}", version_line())?,
        CliCommand::Help => writeln!(out, "{}", USAGE)?,
        CliCommand::Invalid(reason) => return Err(eyre!("{}\n\n{}", reason, USAGE)),
        CliCommand::Status => {
            let session = builder.build().await.map_err(describe)?;
            match session.credential() {
                None => writeln!(out, "signed out")?,
                Some(credential) => match credential.seconds_until_expiry() {
                    Some(secs) if secs <= 0 => writeln!(out, "signed in, access token expired")?,
                    Some(secs) => writeln!(out, "signed in, access token expires in {}s", secs)?,
                    None => writeln!(out, "signed in, access token expiry unknown")?,
                },
            }
        }
        CliCommand::Login {
            access_token,
            refresh_token,
        } => {
            let session = builder.build().await.map_err(describe)?;
            session
                .login(Credential::new(access_token, refresh_token))
                .await;
            writeln!(out, "signed in")?;
        }
        CliCommand::Logout => {
            let session = builder.build().await.map_err(describe)?;
            session.logout().await;
            writeln!(out, "signed out")?;
        }
        CliCommand::Request { method, path, data } => {
            let body = data
                .map(|raw| serde_json::from_str::<Value>(&raw))
                .transpose()
                .wrap_err("--data is not valid JSON")?;

            let session = builder.build().await.map_err(describe)?;
            let value = session
                .request(method, &path, body.as_ref(), &RequestOptions::default())
                .await
                .map_err(describe)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
    }
    Ok(())
}

fn describe(err: SessionError) -> color_eyre::Report {
    eyre!(
        "{} [{}]\nhint: {}",
        err.user_message(),
        err.error_code(),
        err.recovery_hint()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryCredentials, MockHttpClient, MockTokenRefresher};
    use crate::config::SessionConfig;
    use crate::session::Session;
    use crate::traits::{Method, Response};
    use serde_json::json;
    use std::sync::Arc;

    fn builder(http: &MockHttpClient, credentials: &InMemoryCredentials) -> SessionBuilder {
        Session::builder(SessionConfig::new("http://x/api"))
            .with_http_client(Arc::new(http.clone()))
            .with_credentials_provider(Arc::new(credentials.clone()))
            .with_refresher(Arc::new(MockTokenRefresher::new()))
    }

    async fn run(command: CliCommand, credentials: &InMemoryCredentials) -> (Result<()>, String) {
        let http = MockHttpClient::new();
        http.set_response(
            "http://x/api/items",
            Response::json_body(200, &json!({"success": true, "data": [1]})),
        );
        let mut out = Vec::new();
        let result = run_cli_command(command, builder(&http, credentials), &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_version_and_help() {
        let (result, out) = run(CliCommand::Version, &InMemoryCredentials::new()).await;
        assert!(result.is_ok());
        assert_eq!(out.trim(), version_line());

        let (_, out) = run(CliCommand::Help, &InMemoryCredentials::new()).await;
        assert!(out.contains("usage: sessionlink"));
    }

    #[tokio::test]
    async fn test_login_status_logout() {
        let credentials = InMemoryCredentials::new();

        let (_, out) = run(CliCommand::Status, &credentials).await;
        assert_eq!(out.trim(), "signed out");

        let login = CliCommand::Login {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        run(login, &credentials).await.0.unwrap();
        assert_eq!(credentials.stored().unwrap().refresh_token, "r");

        let (_, out) = run(CliCommand::Status, &credentials).await;
        assert_eq!(out.trim(), "signed in, access token expiry unknown");

        run(CliCommand::Logout, &credentials).await.0.unwrap();
        assert!(credentials.stored().is_none());
    }

    #[tokio::test]
    async fn test_request_prints_payload() {
        let credentials = InMemoryCredentials::with_credential(Credential::new("a", "r"));
        let command = CliCommand::Request {
            method: Method::Get,
            path: "/items".to_string(),
            data: None,
        };
        let (result, out) = run(command, &credentials).await;
        result.unwrap();
        assert_eq!(serde_json::from_str::<Value>(&out).unwrap(), json!([1]));
    }

    #[tokio::test]
    async fn test_request_rejects_bad_data() {
        let command = CliCommand::Request {
            method: Method::Post,
            path: "/items".to_string(),
            data: Some("{not json".to_string()),
        };
        let (result, _) = run(command, &InMemoryCredentials::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_is_error() {
        let (result, _) = run(
            CliCommand::Invalid("unknown command 'x'".to_string()),
            &InMemoryCredentials::new(),
        )
        .await;
        assert!(result.unwrap_err().to_string().contains("unknown command"));
    }
}
