use crate::error::Result;

pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// `Ok(false)` on mismatch. Errors only when the stored hash is malformed.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(plain, hash)?)
}
