use rand::Rng;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

/// Temporary password handed to a user created (or reset) by an admin.
/// The account is flagged must_change_password, so strength rules do not
/// apply here.
pub fn generate_temp_password() -> String {
    random_string(12)
}

/// One-time password-reset token, emailed to the user.
pub fn generate_reset_token() -> String {
    random_string(32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_password_shape() {
        let password = generate_temp_password();
        assert_eq!(password.len(), 12);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_not_constant() {
        // Collisions are theoretically possible but vanishingly unlikely.
        assert_ne!(generate_reset_token(), generate_reset_token());
    }
}
