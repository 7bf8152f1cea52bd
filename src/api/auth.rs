//! Administrator login and logout.

use tracing::{info, warn};

use crate::client::{ApiClient, ClientError};
use crate::model::{LoginRequest, LoginResponse, UserIdentity};
use crate::options::SecretString;

const LOGIN_PATH: &str = "/v1/admin/login";

pub struct Auth<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }
}

impl Auth<'_> {
    /// Log in and store the issued token and identity in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity, ClientError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post(LOGIN_PATH).json(&request).send().await?;

        let user = UserIdentity::from(&response);
        let session = self.client.session();
        session.set_token(SecretString::new(response.token))?;
        if let Err(e) = session.set_user(user.clone()) {
            // A token without its identity is not a usable session.
            if let Err(clear_err) = session.clear() {
                warn!("failed to roll back partial login: {}", clear_err);
            }
            return Err(e);
        }
        info!(username = %user.username, role = %user.role, "logged in");
        Ok(user)
    }

    /// Drop the session and return to the login entry point.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.client.session().clear()?;
        self.client.navigator().redirect_to_login();
        info!("logged out");
        Ok(())
    }

    /// Whether both a token and an identity are stored.
    pub fn is_authenticated(&self) -> bool {
        let session = self.client.session();
        session.token().is_some() && session.user().is_some()
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.client.session().user()
    }
}
