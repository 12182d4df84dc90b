use argon2::password_hash::{self, rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id, 19 MiB, 2 passes, 1 lane.
fn argon2id() -> Result<Argon2<'static>, String> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|e| format!("Invalid Argon2 parameters: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a credential into a PHC string suitable for any store.
pub fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2id()?
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| format!("Hashing failed: {e}"))
}

/// `Ok(false)` on a wrong password. `Err` when the stored hash itself is
/// unusable, so callers can tell a bad record from a bad guess.
pub fn verify(password: &str, stored: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(stored).map_err(|e| format!("Malformed password hash: {e}"))?;

    // Parameters are read from the PHC string, not from `argon2id()`
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(format!("Password verification failed: {e}")),
    }
}

pub fn check_length(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}
