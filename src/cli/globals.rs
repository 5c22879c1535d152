use secrecy::SecretString;

/// Process-wide configuration, constructed once at startup and passed by
/// reference into the token service instead of living behind a global.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self { token_secret }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("sssht".to_string()));
        assert_eq!(args.token_secret.expose_secret(), "sssht");
    }

    #[test]
    fn test_global_args_debug_redacts_secret() {
        let args = GlobalArgs::new(SecretString::from("sssht".to_string()));
        let debug = format!("{args:?}");
        assert!(!debug.contains("sssht"));
    }
}
