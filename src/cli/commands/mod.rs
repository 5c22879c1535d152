use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("diaria")
        .about("Personal diary web backend")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("DIARIA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("secret")
                .short('s')
                .long("secret")
                .help("Token signing secret, must be supplied externally in production")
                .env("DIARIA_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("db-host")
                .long("db-host")
                .help("Database host")
                .default_value("localhost")
                .env("DIARIA_DB_HOST"),
        )
        .arg(
            Arg::new("db-port")
                .long("db-port")
                .help("Database port")
                .default_value("5432")
                .env("DIARIA_DB_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("db-user")
                .long("db-user")
                .help("Database user")
                .default_value("postgres")
                .env("DIARIA_DB_USER"),
        )
        .arg(
            Arg::new("db-password")
                .long("db-password")
                .help("Database password")
                .default_value("postgres")
                .env("DIARIA_DB_PASSWORD"),
        )
        .arg(
            Arg::new("db-name")
                .long("db-name")
                .help("Database name")
                .default_value("diaria")
                .env("DIARIA_DB_NAME"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("DIARIA_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "diaria");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Personal diary web backend"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_port_and_secret() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "diaria",
            "--port",
            "8080",
            "--secret",
            "sssht",
            "--db-host",
            "db.internal",
            "--db-name",
            "diary",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(8080));
        assert_eq!(
            matches.get_one::<String>("secret").map(String::as_str),
            Some("sssht")
        );
        assert_eq!(
            matches.get_one::<String>("db-host").map(String::as_str),
            Some("db.internal")
        );
        assert_eq!(
            matches.get_one::<String>("db-name").map(String::as_str),
            Some("diary")
        );
        assert_eq!(matches.get_one::<u16>("db-port").copied(), Some(5432));
        assert_eq!(
            matches.get_one::<String>("db-user").map(String::as_str),
            Some("postgres")
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("DIARIA_PORT", Some("443")),
                ("DIARIA_SECRET", Some("from-env")),
                ("DIARIA_DB_HOST", Some("db.tld")),
                ("DIARIA_DB_USER", Some("diary")),
                ("DIARIA_DB_PASSWORD", Some("hunter2")),
                ("DIARIA_DB_NAME", Some("diary_db")),
                ("DIARIA_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["diaria"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>("secret").map(String::as_str),
                    Some("from-env")
                );
                assert_eq!(
                    matches.get_one::<String>("db-host").map(String::as_str),
                    Some("db.tld")
                );
                assert_eq!(
                    matches.get_one::<String>("db-password").map(String::as_str),
                    Some("hunter2")
                );
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("DIARIA_LOG_LEVEL", Some(level)),
                    ("DIARIA_SECRET", Some("sssht")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["diaria"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").copied(),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("DIARIA_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "diaria".to_string(),
                    "--secret".to_string(),
                    "sssht".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }
}
