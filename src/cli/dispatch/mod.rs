use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let get = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .cloned()
            .with_context(|| format!("missing required argument: --{name}"))
    };

    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        secret: SecretString::from(get("secret")?),
        db_host: get("db-host")?,
        db_port: matches.get_one::<u16>("db-port").copied().unwrap_or(5432),
        db_user: get("db-user")?,
        db_password: SecretString::from(get("db-password")?),
        db_name: get("db-name")?,
    })
}
