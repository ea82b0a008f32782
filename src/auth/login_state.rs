use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

/// Name of the cookie holding the login `state` between redirect and callback.
pub const STATE_COOKIE: &str = "state";
pub const STATE_COOKIE_MAX_AGE_SECS: i64 = 300;

const STATE_BYTES: usize = 32;

/// Source of the anti-CSRF `state` parameter.
pub trait StateGenerator: Send + Sync {
    fn generate(&self) -> anyhow::Result<String>;
}

/// 32 bytes from the OS CSPRNG, base64url without padding.
pub struct OsRngStateGenerator;

impl StateGenerator for OsRngStateGenerator {
    fn generate(&self) -> anyhow::Result<String> {
        let mut buf = [0u8; STATE_BYTES];
        OsRng.try_fill_bytes(&mut buf)?;
        Ok(URL_SAFE_NO_PAD.encode(buf))
    }
}

pub fn states_match(cookie: &str, query: &str) -> bool {
    cookie.as_bytes().ct_eq(query.as_bytes()).into()
}
