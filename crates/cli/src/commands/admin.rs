//! Admin account creation.

use rand::Rng;
use rand::distr::Alphanumeric;

use moostyle_core::{Email, Role};
use moostyle_server::db::users::UserRepository;
use moostyle_server::services::auth::hash_password;

use super::{CliError, connect};

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Create a privileged account with a verified email.
///
/// When no password is supplied one is generated and printed once.
///
/// # Errors
///
/// Returns `CliError::InvalidArgument` for a bad email or role, or a
/// repository error if the email is already taken.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<&str>,
) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let role: Role = role.parse().map_err(CliError::InvalidArgument)?;
    if role == Role::User {
        return Err(CliError::InvalidArgument(
            "use the registration endpoint for regular accounts".to_string(),
        ));
    }

    let generated = password.is_none();
    let password = match password {
        Some(p) => p.to_string(),
        None => generate_password(),
    };

    let password_hash = hash_password(&password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let user = users.create(&email, &password_hash, name, role).await?;
    users.set_email_verified(user.id).await?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %role, "admin account created");

    #[allow(clippy::print_stdout)]
    {
        println!("Created {role} account {} (id {})", user.email, user.id);
        if generated {
            // Shown once; only the hash is stored.
            println!("Generated password: {password}");
        }
    }

    Ok(())
}

/// Random alphanumeric password.
fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password_length() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_password_is_random() {
        assert_ne!(generate_password(), generate_password());
    }
}
