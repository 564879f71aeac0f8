use anyhow::{anyhow, Result};
use keyring::Entry;

use crate::crypto::CookieKey;

const SERVICE_NAME: &str = "sdkconf";
const COOKIE_KEY: &str = "cookie_key";

fn entry(account: &str) -> Result<Entry> {
    Entry::new(SERVICE_NAME, &format!("{}:{}", COOKIE_KEY, account))
        .map_err(|e| anyhow!("keyring init: {e}"))
}

pub fn store_cookie_key(account: &str, key: &CookieKey) -> Result<()> {
    entry(account)?
        .set_password(&key.to_base64())
        .map_err(|e| anyhow!("store cookie key: {e}"))?;
    Ok(())
}

pub fn get_cookie_key(account: &str) -> Result<CookieKey> {
    let encoded = zeroize::Zeroizing::new(
        entry(account)?
            .get_password()
            .map_err(|e| anyhow!("load cookie key: {e}"))?,
    );
    let key = CookieKey::from_base64(&encoded).map_err(|e| anyhow!("decode cookie key: {e}"))?;
    Ok(key)
}

pub fn delete_cookie_key(account: &str) -> Result<()> {
    entry(account)?
        .delete_password()
        .map_err(|e| anyhow!("delete cookie key: {e}"))?;
    Ok(())
}
