//! Command-line argument parsing.

use crate::traits::Method;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Show the stored credential and its expiry
    Status,
    /// Store a credential obtained elsewhere
    Login {
        access_token: String,
        refresh_token: String,
    },
    /// Remove the stored credential
    Logout,
    /// Send an authenticated request
    Request {
        method: Method,
        path: String,
        data: Option<String>,
    },
    /// Arguments that could not be understood
    Invalid(String),
}

pub const USAGE: &str = "\
usage: sessionlink <command>

commands:
  status                              show the stored credential
  login <access-token> <refresh-token>
  logout
  help
  <METHOD> <path> [--data <json>]     send a request (GET, POST, PUT, PATCH, DELETE)

flags:
  -V, --version
  -h, --help";

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use sessionlink::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["sessionlink".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let args: Vec<String> = args.skip(1).collect();

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return CliCommand::Version;
    }
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return CliCommand::Help;
    }

    let Some(command) = args.first() else {
        return CliCommand::Help;
    };
    let rest = &args[1..];

    match command.as_str() {
        "help" => CliCommand::Help,
        "status" => CliCommand::Status,
        "logout" => CliCommand::Logout,
        "login" => match rest {
            [access, refresh] => CliCommand::Login {
                access_token: access.clone(),
                refresh_token: refresh.clone(),
            },
            _ => CliCommand::Invalid("login takes <access-token> <refresh-token>".to_string()),
        },
        other => match Method::parse(other) {
            Some(method) => parse_request(method, rest),
            None => CliCommand::Invalid(format!("unknown command '{}'", other)),
        },
    }
}

fn parse_request(method: Method, rest: &[String]) -> CliCommand {
    let Some((path, flags)) = rest.split_first() else {
        return CliCommand::Invalid(format!("{} needs a path", method.as_str()));
    };

    let data = match flags {
        [] => None,
        [flag, json] if flag == "--data" || flag == "-d" => Some(json.clone()),
        _ => return CliCommand::Invalid(format!("unexpected arguments: {}", flags.join(" "))),
    };

    CliCommand::Request {
        method,
        path: path.clone(),
        data,
    }
}
