use rand::{Rng, distributions::Alphanumeric};

/// Length of the activation secret mailed to newly registered users.
pub const ACTIVATION_SECRET_LENGTH: usize = 32;

/// Generates a random alphanumeric string of the specified length.
///
/// Draws from the thread-local CSPRNG, so the output is suitable for
/// activation secrets and other unguessable identifiers.
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generates a fresh activation secret.
pub fn generate_activation_secret() -> String {
    generate_random_string(ACTIVATION_SECRET_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_strings_are_alphanumeric() {
        let token = generate_random_string(48);
        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_activation_secrets_differ() {
        let first = generate_activation_secret();
        let second = generate_activation_secret();
        assert_eq!(first.len(), ACTIVATION_SECRET_LENGTH);
        assert_ne!(first, second);
    }
}
