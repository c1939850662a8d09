//! TLS settings for the connection to the S3 endpoint

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;
use aws_smithy_runtime_api::client::http::SharedHttpClient;
use rustls::{
    client::{ServerCertVerified, ServerCertVerifier},
    Certificate, ClientConfig, OwnedTrustAnchor, RootCertStore, ServerName,
};

use crate::types::{Configuration, ConfigurationError};

/// Builds the rustls client settings from `ca_cert` and `skip_ssl_verification`
///
/// # Errors
///
/// Returns `ConfigurationError::CaCert` when the CA bundle cannot be read or
/// contains no usable certificate
pub fn client_config(configuration: &Configuration) -> Result<ClientConfig, ConfigurationError> {
    let roots = if configuration.ca_cert.is_empty() {
        default_roots()
    } else {
        load_ca_bundle(Path::new(&configuration.ca_cert))?
    };

    let mut tls = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    if configuration.skip_ssl_verification {
        tracing::warn!("TLS certificate verification is disabled for the S3 endpoint");
        tls.dangerous()
            .set_certificate_verifier(Arc::new(NoCertificateVerification));
    }

    Ok(tls)
}

/// HTTPS client for the SDK using [`client_config`]
///
/// # Errors
///
/// See [`client_config`]
pub fn http_client(configuration: &Configuration) -> Result<SharedHttpClient, ConfigurationError> {
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(client_config(configuration)?)
        .https_or_http()
        .enable_http1()
        .build();

    Ok(HyperClientBuilder::new().build(connector))
}

fn default_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));
    roots
}

fn load_ca_bundle(path: &Path) -> Result<RootCertStore, ConfigurationError> {
    let file = File::open(path)
        .map_err(|e| ConfigurationError::CaCert(format!("{}: {e}", path.display())))?;

    let ders = rustls_pemfile::certs(&mut BufReader::new(file))
        .map_err(|e| ConfigurationError::CaCert(format!("{}: {e}", path.display())))?;

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(&ders);
    if added == 0 {
        return Err(ConfigurationError::CaCert(format!(
            "{}: no valid certificate found",
            path.display()
        )));
    }
    if ignored > 0 {
        tracing::warn!(ignored, "Skipped unparsable certificates in CA bundle");
    }

    Ok(roots)
}

/// Accepts every server certificate
struct NoCertificateVerification;

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}
