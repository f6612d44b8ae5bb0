use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::saved::{prefs_key, saved_key};
use super::schema::Database;

/// Storage partition used when no session is active. A valid partition, not
/// an error state.
pub const GUEST_USER_KEY: &str = "guest";

/// Key holding the single local account record.
const ACCOUNT_KEY: &str = "blockwise_user";
/// Key holding the lowercased email of the logged-in account, absent for guest.
const SESSION_KEY: &str = "current_user";

/// Errors from the authentication flows.
///
/// `CredentialMismatch` deliberately does not say which field was wrong, to
/// avoid confirming whether an email has an account.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No account found. Sign up first.")]
    NotFound,
    #[error("Incorrect email or password.")]
    CredentialMismatch,
    /// A form field failed validation; the message is shown inline as-is.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Signup form input, confirmation fields included.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub email: String,
    pub confirm_email: String,
    pub password: String,
    pub confirm_password: String,
}

/// The single stored credential record.
#[derive(Debug, Serialize, Deserialize)]
struct AccountRecord {
    email: String,
    hash: String,
}

/// Hex-encoded SHA-256 of the plaintext password.
///
/// Unsalted single-round hashing matches the single-slot local-demo storage
/// scheme; anything beyond that needs a salted memory-hard KDF.
fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

impl Database {
    // ========================================================================
    // Credential / Session Operations
    // ========================================================================

    /// Create (or overwrite) the local account.
    ///
    /// Single-slot model: a prior account is replaced without warning.
    /// Signing up does not log the user in.
    pub async fn sign_up(&self, form: &SignupForm) -> Result<(), AuthError> {
        if form.email.trim().is_empty() || form.password.trim().is_empty() {
            return Err(AuthError::Validation("All fields are required.".into()));
        }
        if form.email != form.confirm_email {
            return Err(AuthError::Validation("Emails do not match.".into()));
        }
        if form.password != form.confirm_password {
            return Err(AuthError::Validation("Passwords do not match.".into()));
        }

        let record = AccountRecord {
            email: form.email.to_lowercase(),
            hash: hash_password(&form.password),
        };
        self.store_account(&record).await?;
        tracing::info!(email = %record.email, "Account created");
        Ok(())
    }

    /// Log in against the stored account; on success the session marker is
    /// set and the user key (lowercased email) is returned.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let record = self.load_account().await?.ok_or(AuthError::NotFound)?;

        if record.email != email.to_lowercase() || record.hash != hash_password(password) {
            return Err(AuthError::CredentialMismatch);
        }

        self.set_value(SESSION_KEY, &record.email)
            .await
            .map_err(AuthError::Storage)?;
        Ok(record.email)
    }

    /// Clear the session and the departing user's saved-article partition.
    /// A no-op in guest mode.
    pub async fn log_out(&self) -> Result<()> {
        if let Some(user) = self.current_user().await? {
            self.remove_values(&[SESSION_KEY, &saved_key(&user)]).await?;
            tracing::info!(email = %user, "Logged out");
        }
        Ok(())
    }

    /// First step of the password reset: verify the email names the stored
    /// account.
    pub async fn begin_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let record = self.load_account().await?.ok_or(AuthError::NotFound)?;
        if record.email != email.to_lowercase() {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    /// Second step: overwrite the stored hash. Does not log the user in.
    pub async fn complete_password_reset(
        &self,
        email: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.trim().is_empty() || confirm_password.trim().is_empty() {
            return Err(AuthError::Validation("All fields are required.".into()));
        }
        if new_password != confirm_password {
            return Err(AuthError::Validation("Passwords do not match.".into()));
        }
        // Re-verify in case the caller skipped the first step.
        self.begin_password_reset(email).await?;

        let record = AccountRecord {
            email: email.to_lowercase(),
            hash: hash_password(new_password),
        };
        self.store_account(&record).await?;
        tracing::info!(email = %record.email, "Password reset");
        Ok(())
    }

    /// Delete the account and every partition belonging to it: session
    /// marker, preferences, saved list, and the credential record. Guest
    /// partitions are untouched; without an active session this is a no-op.
    pub async fn delete_account(&self) -> Result<()> {
        let Some(user) = self.current_user().await? else {
            return Ok(());
        };
        self.remove_values(&[
            SESSION_KEY,
            &prefs_key(&user),
            &saved_key(&user),
            ACCOUNT_KEY,
        ])
        .await?;
        tracing::info!(email = %user, "Account deleted");
        Ok(())
    }

    /// The logged-in user's lowercased email, or `None` in guest mode.
    pub async fn current_user(&self) -> Result<Option<String>> {
        Ok(self
            .get_value(SESSION_KEY)
            .await?
            .map(|email| email.to_lowercase()))
    }

    /// The storage-partition identifier: the session email, or `"guest"`.
    pub async fn user_key(&self) -> Result<String> {
        Ok(self
            .current_user()
            .await?
            .unwrap_or_else(|| GUEST_USER_KEY.to_string()))
    }

    async fn load_account(&self) -> Result<Option<AccountRecord>> {
        let Some(raw) = self.get_value(ACCOUNT_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // A corrupt credential record is unrecoverable either way;
                // treat it as no account so the user can sign up again.
                tracing::warn!(error = %e, "Corrupt account record, treating as absent");
                Ok(None)
            }
        }
    }

    async fn store_account(&self, record: &AccountRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.set_value(ACCOUNT_KEY, &json).await
    }
}
