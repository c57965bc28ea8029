//! Custom certificate-authority trust store.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ureq::tls::{parse_pem, Certificate, PemItem, RootCerts, TlsConfig};

use crate::error::OptionError;

/// Certificate authorities loaded from a PEM bundle.
///
/// When installed on a `ClientConfig`, these are the only roots the client
/// accepts as issuers of the peer certificate.
#[derive(Clone)]
pub struct TrustStore {
    source: PathBuf,
    certs: Arc<Vec<Certificate<'static>>>,
}

impl TrustStore {
    /// Read and parse the PEM bundle at `path`.
    ///
    /// Fails if the file cannot be read, if any PEM block is malformed, or
    /// if the bundle holds no certificate. Private keys in the bundle are
    /// skipped.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, OptionError> {
        let path = path.as_ref();
        let pem = fs::read(path).map_err(|source| OptionError::ReadCertificate {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(path, &pem)
    }

    fn from_pem(path: &Path, pem: &[u8]) -> Result<Self, OptionError> {
        let mut certs = Vec::new();
        for item in parse_pem(pem) {
            let item = item.map_err(|source| OptionError::ParseCertificate {
                path: path.to_path_buf(),
                source,
            })?;
            if let PemItem::Certificate(cert) = item {
                certs.push(cert.to_owned());
            }
        }
        if certs.is_empty() {
            return Err(OptionError::NoCertificate {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            source: path.to_path_buf(),
            certs: Arc::new(certs),
        })
    }

    /// Path the bundle was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub(crate) fn tls_config(&self) -> TlsConfig {
        TlsConfig::builder()
            .root_certs(RootCerts::new_with_certs(self.certs.as_slice()))
            .build()
    }
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("source", &self.source)
            .field("certs", &self.certs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CA: &[u8] = include_bytes!("../tests/fixtures/ca.pem");

    #[test]
    fn loads_single_certificate() {
        let store = TrustStore::from_pem(Path::new("ca.pem"), CA).unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert_eq!(store.source(), Path::new("ca.pem"));
    }

    #[test]
    fn loads_every_certificate_in_a_bundle() {
        let mut bundle = CA.to_vec();
        bundle.extend_from_slice(CA);
        let store = TrustStore::from_pem(Path::new("bundle.pem"), &bundle).unwrap();
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }

    #[test]
    fn rejects_content_without_certificates() {
        let err = TrustStore::from_pem(Path::new("empty.pem"), b"not a pem file\n").unwrap_err();
        assert!(matches!(
            err,
            OptionError::NoCertificate { .. } | OptionError::ParseCertificate { .. }
        ));
    }

    #[test]
    fn rejects_missing_file() {
        let err = TrustStore::from_pem_file("/nonexistent/httpcli/ca.pem").unwrap_err();
        assert!(matches!(err, OptionError::ReadCertificate { .. }));
        assert!(err.to_string().contains("/nonexistent/httpcli/ca.pem"));
    }
}
