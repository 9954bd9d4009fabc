use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cognitoidentityprovider::operation::confirm_sign_up::ConfirmSignUpError;
use aws_sdk_cognitoidentityprovider::operation::get_user::GetUserError;
use aws_sdk_cognitoidentityprovider::operation::global_sign_out::GlobalSignOutError;
use aws_sdk_cognitoidentityprovider::operation::initiate_auth::InitiateAuthError;
use aws_sdk_cognitoidentityprovider::operation::sign_up::SignUpError;
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client;

use super::{AuthTokens, IdentityError, IdentityProvider, UserHandle};

/// Managed identity provider backed by a Cognito user pool app client.
pub struct CognitoIdentity {
    client: Client,
    client_id: String,
}

impl CognitoIdentity {
    /// Build a provider from shared SDK configuration, so the emulator endpoint
    /// and credentials apply exactly as they do for S3 and SQS.
    pub fn new(sdk_config: &aws_config::SdkConfig, client_id: &str) -> Self {
        tracing::info!(client_id = %client_id, "Using Cognito identity provider");
        Self {
            client: Client::new(sdk_config),
            client_id: client_id.to_string(),
        }
    }
}

fn message_of<E: ProvideErrorMetadata>(e: &E, fallback: &str) -> String {
    e.message().unwrap_or(fallback).to_string()
}

/// Map a failed call onto the identity error taxonomy. Anything `classify`
/// does not recognise is a backend failure.
fn sdk_failure<E, R>(
    action: &str,
    e: SdkError<E, R>,
    classify: impl FnOnce(&E) -> Option<IdentityError>,
) -> IdentityError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    if let Some(mapped) = e.as_service_error().and_then(classify) {
        return mapped;
    }
    IdentityError::Backend(format!("Cognito {action} failed: {}", DisplayErrorContext(&e)))
}

fn sign_up_failure(e: &SignUpError) -> Option<IdentityError> {
    e.is_username_exists_exception()
        .then(|| IdentityError::AlreadyExists(message_of(e, "user already exists")))
}

fn confirm_failure(e: &ConfirmSignUpError) -> Option<IdentityError> {
    if e.is_user_not_found_exception() {
        Some(IdentityError::NotFound(message_of(e, "user not found")))
    } else if e.is_alias_exists_exception() {
        Some(IdentityError::AlreadyExists(message_of(e, "email already exists")))
    } else if e.is_code_mismatch_exception() || e.is_expired_code_exception() {
        Some(IdentityError::Unauthenticated(message_of(
            e,
            "invalid confirmation code",
        )))
    } else {
        None
    }
}

/// Unknown users look like bad credentials to sign-in callers.
fn sign_in_failure(e: &InitiateAuthError) -> Option<IdentityError> {
    (e.is_not_authorized_exception()
        || e.is_user_not_found_exception()
        || e.is_user_not_confirmed_exception()
        || e.is_password_reset_required_exception())
    .then(|| IdentityError::Unauthenticated(message_of(e, "invalid username or password")))
}

fn get_user_failure(e: &GetUserError) -> Option<IdentityError> {
    (e.is_not_authorized_exception()
        || e.is_user_not_found_exception()
        || e.is_user_not_confirmed_exception()
        || e.is_password_reset_required_exception())
    .then(|| IdentityError::Unauthenticated(message_of(e, "invalid token")))
}

#[async_trait]
impl IdentityProvider for CognitoIdentity {
    async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<UserHandle, IdentityError> {
        let email_attribute = AttributeType::builder()
            .name("email")
            .value(email)
            .build()
            .map_err(|e| IdentityError::Backend(e.to_string()))?;

        let output = self
            .client
            .sign_up()
            .client_id(&self.client_id)
            .username(username)
            .password(password)
            .user_attributes(email_attribute)
            .send()
            .await
            .map_err(|e| sdk_failure("SignUp", e, sign_up_failure))?;

        Ok(UserHandle {
            id: output.user_sub().to_string(),
            username: username.to_string(),
            email: Some(email.to_string()),
            confirmed: output.user_confirmed(),
        })
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), IdentityError> {
        self.client
            .confirm_sign_up()
            .client_id(&self.client_id)
            .username(username)
            .confirmation_code(code)
            .send()
            .await
            .map_err(|e| sdk_failure("ConfirmSignUp", e, confirm_failure))?;
        Ok(())
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthTokens, IdentityError> {
        let output = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", password)
            .send()
            .await
            .map_err(|e| sdk_failure("InitiateAuth", e, sign_in_failure))?;

        let Some(result) = output.authentication_result() else {
            return Err(IdentityError::Unauthenticated(format!(
                "additional challenge required: {}",
                output.challenge_name().map(|c| c.as_str()).unwrap_or_default()
            )));
        };

        let access_token = result
            .access_token()
            .ok_or_else(|| IdentityError::Backend("Cognito returned no access token".into()))?
            .to_string();

        Ok(AuthTokens {
            id_token: result.id_token().unwrap_or(access_token.as_str()).to_string(),
            access_token,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<UserHandle, IdentityError> {
        let output = self
            .client
            .get_user()
            .access_token(access_token)
            .send()
            .await
            .map_err(|e| sdk_failure("GetUser", e, get_user_failure))?;

        let attribute = |name: &str| {
            output
                .user_attributes()
                .iter()
                .find(|a| a.name() == name)
                .and_then(|a| a.value())
                .map(str::to_string)
        };

        Ok(UserHandle {
            id: attribute("sub").unwrap_or_else(|| output.username().to_string()),
            email: attribute("email"),
            username: output.username().to_string(),
            confirmed: true,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let outcome = self
            .client
            .global_sign_out()
            .access_token(access_token)
            .send()
            .await;

        match outcome {
            Ok(_) => Ok(()),
            // Already revoked or expired
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(GlobalSignOutError::is_not_authorized_exception) =>
            {
                Ok(())
            }
            Err(e) => Err(sdk_failure("GlobalSignOut", e, |_| None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cognitoidentityprovider::error::ErrorMetadata;
    use aws_sdk_cognitoidentityprovider::types::error::{
        CodeMismatchException, NotAuthorizedException, UserNotFoundException,
        UsernameExistsException,
    };

    #[test]
    fn test_sign_up_maps_existing_username() {
        let e = SignUpError::UsernameExistsException(
            UsernameExistsException::builder()
                .message("User already exists")
                .build(),
        );
        assert!(matches!(
            sign_up_failure(&e),
            Some(IdentityError::AlreadyExists(message)) if message == "User already exists"
        ));
    }

    #[test]
    fn test_confirm_maps_unknown_user_and_bad_code() {
        let e = ConfirmSignUpError::UserNotFoundException(UserNotFoundException::builder().build());
        assert!(matches!(confirm_failure(&e), Some(IdentityError::NotFound(_))));

        let e = ConfirmSignUpError::CodeMismatchException(CodeMismatchException::builder().build());
        assert!(matches!(
            confirm_failure(&e),
            Some(IdentityError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_sign_in_hides_unknown_users() {
        let e = InitiateAuthError::UserNotFoundException(UserNotFoundException::builder().build());
        assert!(matches!(
            sign_in_failure(&e),
            Some(IdentityError::Unauthenticated(message)) if message == "invalid username or password"
        ));

        let e = InitiateAuthError::NotAuthorizedException(
            NotAuthorizedException::builder()
                .message("Incorrect username or password.")
                .build(),
        );
        assert!(matches!(
            sign_in_failure(&e),
            Some(IdentityError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_get_user_rejects_revoked_token() {
        let e = GetUserError::NotAuthorizedException(NotAuthorizedException::builder().build());
        assert!(matches!(
            get_user_failure(&e),
            Some(IdentityError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_unrecognised_errors_are_not_classified() {
        let e = SignUpError::generic(ErrorMetadata::builder().code("InternalErrorException").build());
        assert!(sign_up_failure(&e).is_none());

        let e = InitiateAuthError::generic(ErrorMetadata::builder().code("TooManyRequestsException").build());
        assert!(sign_in_failure(&e).is_none());
    }
}
