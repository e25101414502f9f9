//! Container scoped shared access signatures (service SAS).
//!
//! The signature is an HMAC-SHA256 over the service SAS string-to-sign for
//! storage service version [`SAS_VERSION`], keyed with the decoded account key.
//! Only container (`sr=c`) signatures are produced.

use std::fmt;

use base64::prelude::*;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Error, Result};

/// Storage service version used to sign and to interpret the token
pub const SAS_VERSION: &str = "2021-08-06";

const SIGNED_RESOURCE_CONTAINER: &str = "c";

/// Permissions granted by a blob SAS.
///
/// Rendered in the canonical order the storage service expects (`racwdxt`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SasPermissions {
    pub read: bool,
    pub add: bool,
    pub create: bool,
    pub write: bool,
    pub delete: bool,
    pub delete_previous_version: bool,
    pub tag: bool,
}

impl SasPermissions {
    /// Everything the server needs to read a staged blob and write its error files
    pub const fn staging() -> Self {
        Self {
            read: true,
            add: true,
            create: true,
            write: true,
            delete: true,
            delete_previous_version: true,
            tag: true,
        }
    }
}

impl fmt::Display for SasPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.read, 'r'),
            (self.add, 'a'),
            (self.create, 'c'),
            (self.write, 'w'),
            (self.delete, 'd'),
            (self.delete_previous_version, 'x'),
            (self.tag, 't'),
        ];
        for (_, flag) in flags.iter().filter(|(enabled, _)| *enabled) {
            write!(f, "{flag}")?;
        }
        Ok(())
    }
}

/// A minted container SAS together with the scope it was signed for.
#[derive(Clone)]
pub struct ContainerSas {
    container: String,
    permissions: SasPermissions,
    expiry: DateTime<Utc>,
    token: String,
}

impl ContainerSas {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn permissions(&self) -> SasPermissions {
        self.permissions
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Query string form of the signature, without a leading `?`
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for ContainerSas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerSas")
            .field("container", &self.container)
            .field("permissions", &self.permissions.to_string())
            .field("expiry", &self.expiry)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Sign a SAS granting `permissions` on `container` until `expiry`.
pub fn generate_container_sas(
    account_name: &str,
    account_key: &str,
    container: &str,
    permissions: SasPermissions,
    expiry: DateTime<Utc>,
) -> Result<ContainerSas> {
    let key = BASE64_STANDARD
        .decode(account_key)
        .map_err(|_| Error::InvalidAccountKey)?;

    let signed_permissions = permissions.to_string();
    let signed_expiry = format_sas_time(expiry);
    let canonicalized_resource = format!("/blob/{account_name}/{container}");

    let string_to_sign = string_to_sign(
        &signed_permissions,
        &signed_expiry,
        &canonicalized_resource,
    );

    let mut mac = Hmac::<Sha256>::new_from_slice(&key).map_err(|_| Error::InvalidAccountKey)?;
    mac.update(string_to_sign.as_bytes());
    let signature = BASE64_STANDARD.encode(mac.finalize().into_bytes());

    let token = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("se", &signed_expiry)
        .append_pair("sp", &signed_permissions)
        .append_pair("sv", SAS_VERSION)
        .append_pair("sr", SIGNED_RESOURCE_CONTAINER)
        .append_pair("sig", &signature)
        .finish();

    Ok(ContainerSas {
        container: container.to_string(),
        permissions,
        expiry,
        token,
    })
}

/// Service SAS string-to-sign for versions 2020-12-06 and later.
///
/// Fields: permissions, start, expiry, resource, identifier, IP, protocol,
/// version, resource type, snapshot time, encryption scope, then the five
/// response header overrides. Unused fields stay empty.
fn string_to_sign(permissions: &str, expiry: &str, canonicalized_resource: &str) -> String {
    [
        permissions,
        "",
        expiry,
        canonicalized_resource,
        "",
        "",
        "",
        SAS_VERSION,
        SIGNED_RESOURCE_CONTAINER,
        "",
        "",
        "",
        "",
        "",
        "",
        "",
    ]
    .join("\n")
}

fn format_sas_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    const KEY: &str = "c2VjcmV0LWFjY291bnQta2V5";

    fn query_pairs(token: &str) -> HashMap<String, String> {
        url::form_urlencoded::parse(token.as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn test_staging_permissions_order() {
        assert_eq!(SasPermissions::staging().to_string(), "racwdxt");
        assert_eq!(SasPermissions::default().to_string(), "");

        let read_only = SasPermissions {
            read: true,
            ..Default::default()
        };
        assert_eq!(read_only.to_string(), "r");
    }

    #[test]
    fn test_token_fields() {
        let expiry = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();

        let sas =
            generate_container_sas("acc", KEY, "staging", SasPermissions::staging(), expiry).unwrap();
        let pairs = query_pairs(sas.token());

        assert_eq!(sas.container(), "staging");
        assert_eq!(sas.expiry(), expiry);
        assert_eq!(pairs["se"], "2026-10-19T08:30:00Z");
        assert_eq!(pairs["sp"], "racwdxt");
        assert_eq!(pairs["sv"], SAS_VERSION);
        assert_eq!(pairs["sr"], "c");
        assert!(!pairs.contains_key("st"));
    }

    #[test]
    fn test_signature_matches_string_to_sign() {
        let expiry = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let sas =
            generate_container_sas("acc", KEY, "staging", SasPermissions::staging(), expiry).unwrap();
        let pairs = query_pairs(sas.token());

        let expected_sts = format!(
            "racwdxt\n\n2026-01-01T00:00:00Z\n/blob/acc/staging\n\n\n\n{SAS_VERSION}\nc\n\n\n\n\n\n\n"
        );
        let mut mac = Hmac::<Sha256>::new_from_slice(&BASE64_STANDARD.decode(KEY).unwrap()).unwrap();
        mac.update(expected_sts.as_bytes());
        let expected = BASE64_STANDARD.encode(mac.finalize().into_bytes());

        assert_eq!(pairs["sig"], expected);
    }

    #[test]
    fn test_signature_depends_on_container() {
        let expiry = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let a = generate_container_sas("acc", KEY, "one", SasPermissions::staging(), expiry).unwrap();
        let b = generate_container_sas("acc", KEY, "two", SasPermissions::staging(), expiry).unwrap();

        assert_ne!(query_pairs(a.token())["sig"], query_pairs(b.token())["sig"]);
    }

    #[test]
    fn test_invalid_key() {
        let result = generate_container_sas(
            "acc",
            "not base64!",
            "staging",
            SasPermissions::staging(),
            Utc::now(),
        );

        assert!(matches!(result, Err(Error::InvalidAccountKey)));
    }

    #[test]
    fn test_debug_hides_token() {
        let sas = generate_container_sas("acc", KEY, "staging", SasPermissions::staging(), Utc::now())
            .unwrap();

        assert!(!format!("{sas:?}").contains(sas.token()));
    }
}
