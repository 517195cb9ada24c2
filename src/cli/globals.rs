use crate::janua::oauth::ProviderConfig;
use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
    pub cookie_secure: bool,
    pub frontend_url: Option<String>,
    pub oauth: ProviderConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_secret: SecretString, oauth: ProviderConfig) -> Self {
        Self {
            token_secret,
            cookie_secure: true,
            frontend_url: None,
            oauth,
        }
    }

    pub fn set_cookie_secure(&mut self, secure: bool) {
        self.cookie_secure = secure;
    }

    pub fn set_frontend_url(&mut self, url: Option<String>) {
        self.frontend_url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let oauth = ProviderConfig::google(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "https://janua.dev/google/callback".to_string(),
        );
        let args = GlobalArgs::new(SecretString::from("sssht".to_string()), oauth);
        assert_eq!(args.token_secret.expose_secret(), "sssht");
        assert!(args.cookie_secure);
        assert!(args.frontend_url.is_none());
        assert_eq!(args.oauth.client_id, "client-id");
    }

    #[test]
    fn test_global_args_setters() {
        let oauth = ProviderConfig::google(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "https://janua.dev/google/callback".to_string(),
        );
        let mut args = GlobalArgs::new(SecretString::from("sssht".to_string()), oauth);
        args.set_cookie_secure(false);
        args.set_frontend_url(Some("https://app.janua.dev".to_string()));
        assert!(!args.cookie_secure);
        assert_eq!(args.frontend_url.as_deref(), Some("https://app.janua.dev"));
    }
}
