//! Password digests and session tokens.

use std::num::NonZeroU32;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ring::digest;
use ring::error::Unspecified;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;
const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

/// A salted password digest, both halves base64-encoded for storage.
#[derive(Debug, Clone)]
pub struct Credential {
    pub salt: String,
    pub hash: String,
}

pub fn hash_password(rng: &SystemRandom, password: &str) -> Result<Credential, Unspecified> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)?;

    let mut hash = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(Credential {
        salt: STANDARD.encode(salt),
        hash: STANDARD.encode(hash),
    })
}

/// Constant-time check of `password` against a stored digest. Undecodable
/// credential material never verifies.
pub fn verify_password(salt: &str, hash: &str, password: &str) -> bool {
    let (Ok(salt), Ok(hash)) = (STANDARD.decode(salt), STANDARD.decode(hash)) else {
        return false;
    };
    pbkdf2::verify(
        PBKDF2_ALG,
        PBKDF2_ITERATIONS,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

/// Fresh opaque session token from the system CSPRNG.
pub fn generate_token(rng: &SystemRandom) -> Result<String, Unspecified> {
    let mut bytes = [0u8; TOKEN_LEN];
    rng.fill(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Compare two tokens through their digests so timing does not depend on
/// how many leading bytes match.
pub fn tokens_match(presented: &str, expected: &str) -> bool {
    let a = digest::digest(&digest::SHA256, presented.as_bytes());
    let b = digest::digest(&digest::SHA256, expected.as_bytes());
    a.as_ref() == b.as_ref()
}
