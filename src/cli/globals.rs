use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
    pub client_base_url: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_secret: SecretString, client_base_url: String) -> Self {
        Self {
            token_secret,
            client_base_url,
        }
    }
}
