//! Resource naming
//!
//! Generated names have a fixed structure and a random suffix. Nothing is
//! cached: a collision on a generated account name is fatal for the call and
//! the next invocation generates a fresh one.

use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use crate::error::{AzstoreError, Result};

const ACCOUNT_NAME_PREFIX: &str = "imageregistry";
const ACCOUNT_NAME_MAX_LEN: usize = 24;
const ACCOUNT_NAME_SUFFIX_LEN: usize = 5;
const CONTAINER_NAME_MAX_LEN: usize = 63;

/// Generate a storage account name for the cluster `infra_name`
pub fn generate_account_name(infra_name: &str) -> String {
    generate_account_name_with(infra_name, &mut rand::thread_rng())
}

pub fn generate_account_name_with<R: Rng + ?Sized>(infra_name: &str, rng: &mut R) -> String {
    let mut name: String = format!("{}{}", ACCOUNT_NAME_PREFIX, infra_name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    name.truncate(ACCOUNT_NAME_MAX_LEN - ACCOUNT_NAME_SUFFIX_LEN);

    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .take(ACCOUNT_NAME_SUFFIX_LEN)
        .map(char::from)
        .collect();
    name.push_str(&suffix);

    name.to_lowercase()
}

/// Storage account names are 3-24 lowercase letters and digits
pub fn validate_account_name(name: &str) -> Result<()> {
    let pattern = Regex::new(r"^[a-z0-9]{3,24}$")?;
    if !pattern.is_match(name) {
        return Err(AzstoreError::invalid_name(
            name,
            "storage account names must be 3-24 characters of lowercase letters and digits",
        ));
    }
    Ok(())
}

pub fn is_valid_account_name(name: &str) -> bool {
    validate_account_name(name).is_ok()
}

/// Generate a container name for the cluster `infra_name`
pub fn generate_container_name(infra_name: &str) -> Result<String> {
    let raw = format!(
        "{}-image-registry-{}",
        infra_name,
        Uuid::new_v4().simple()
    )
    .to_lowercase();

    let invalid = Regex::new(r"[^a-z0-9-]")?;
    let dashes = Regex::new(r"-{2,}")?;
    let name = invalid.replace_all(&raw, "-");
    let mut name = dashes.replace_all(&name, "-").into_owned();
    name.truncate(CONTAINER_NAME_MAX_LEN);

    Ok(name.trim_matches('-').to_string())
}

/// Container names are 3-63 characters of lowercase letters, digits and
/// single hyphens, starting and ending with a letter or digit
pub fn validate_container_name(name: &str) -> Result<()> {
    let pattern = Regex::new(r"^[a-z0-9]([a-z0-9]|-[a-z0-9])*$")?;
    if name.len() < 3 || name.len() > CONTAINER_NAME_MAX_LEN || !pattern.is_match(name) {
        return Err(AzstoreError::invalid_name(
            name,
            "container names must be 3-63 characters of lowercase letters, digits and single hyphens",
        ));
    }
    Ok(())
}

pub fn is_valid_container_name(name: &str) -> bool {
    validate_container_name(name).is_ok()
}

pub fn generate_private_endpoint_name(account_name: &str) -> String {
    format!("{}-pe", account_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_account_name_structure() {
        let name = generate_account_name("mycluster-x7k2p");
        assert!(name.starts_with("imageregistrymyclus"));
        assert_eq!(name.len(), 24);
        assert!(is_valid_account_name(&name));
    }

    #[test]
    fn test_account_name_strips_invalid_characters() {
        let name = generate_account_name("a_b.c");
        assert!(name.starts_with("imageregistryabc"));
        assert_eq!(name.len(), "imageregistryabc".len() + 5);
        assert!(is_valid_account_name(&name));
    }

    #[test]
    fn test_account_name_is_deterministic_with_seeded_rng() {
        let first = generate_account_name_with("infra", &mut StdRng::seed_from_u64(7));
        let second = generate_account_name_with("infra", &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn test_account_names_are_not_cached() {
        assert_ne!(generate_account_name("infra"), generate_account_name("infra"));
    }

    #[test]
    fn test_validate_account_name() {
        assert!(is_valid_account_name("acct1"));
        assert!(!is_valid_account_name("ab"));
        assert!(!is_valid_account_name("Acct1"));
        assert!(!is_valid_account_name("acct-1"));
        assert!(!is_valid_account_name("a23456789012345678901234x"));
    }

    #[test]
    fn test_container_name() {
        let name = generate_container_name("My_Cluster").unwrap();
        assert!(name.starts_with("my-cluster-image-registry-"));
        assert!(name.len() <= 63);
        assert!(is_valid_container_name(&name));

        let long = generate_container_name(&"x".repeat(80)).unwrap();
        assert_eq!(long.len(), 63);
        assert!(is_valid_container_name(&long));
    }

    #[test]
    fn test_validate_container_name() {
        assert!(is_valid_container_name("c1c"));
        assert!(!is_valid_container_name("c1"));
        assert!(!is_valid_container_name("-abc"));
        assert!(!is_valid_container_name("ab--cd"));
        assert!(!is_valid_container_name("abc-"));
    }

    #[test]
    fn test_private_endpoint_name() {
        assert_eq!(generate_private_endpoint_name("acct1"), "acct1-pe");
    }
}
