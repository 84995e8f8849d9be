mod util;

use std::fs;

use privca::cert::Certificate;
use privca::cert::params::DistinguishedName;
use privca::csr::CertificateSigningRequest;
use privca::error::PrivCaError;
use privca::report::{Report, Status};
use privca::store::{Artifact, CaStore};
use privca::tls::TlsIssuer;
use util::{ScriptedBackend, Step, create_ca, list_dir, test_config};

#[test]
fn unregistered_ca_fails_without_touching_the_disk() {
    let dir = tempfile::tempdir().unwrap();
    let result = TlsIssuer::new(test_config(dir.path())).issue("Ghost CA", "a.local");

    assert!(matches!(result, Err(PrivCaError::NotRegistered { .. })));
    let report = Report::from_tls_result(&result);
    assert_eq!(
        report,
        Report::failed("The CA (Ghost CA) is not registered yet in the database.")
    );
    assert_eq!(report.exit_code(), 1);
    assert!(list_dir(dir.path()).is_empty());
}

#[test]
fn files_are_named_after_the_primary_identifier() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");

    let leaf = TlsIssuer::new(test_config(dir.path()))
        .issue("Test CA", "a.example.com,b.example.com")
        .unwrap();
    assert_eq!(leaf.primary, "a.example.com");
    assert_eq!(
        Report::from_tls_result(&Ok(leaf.clone())),
        Report::ok("The TLS certificate has been created for the FQDN (a.example.com).")
    );

    let store = CaStore::new(dir.path(), "Test CA");
    assert_eq!(
        list_dir(&store.tls_dir()),
        ["a.example.com.csr", "a.example.com.key", "a.example.com.pem"]
    );
    assert_eq!(leaf.key_path, store.leaf_key_path("a.example.com"));

    let cert = Certificate::from_pem(&fs::read_to_string(&leaf.cert_path).unwrap()).unwrap();
    assert_eq!(cert.subject_common_name(), "a.example.com");

    let csr =
        CertificateSigningRequest::from_pem(&fs::read_to_string(&leaf.csr_path).unwrap()).unwrap();
    assert!(csr.verify().is_ok());
    assert_eq!(
        DistinguishedName::from_x509_name(csr.subject()).common_name,
        "a.example.com"
    );
}

#[test]
fn every_identifier_becomes_a_san_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");

    let leaf = TlsIssuer::new(test_config(dir.path()))
        .issue("Test CA", "example.com,www.example.com,192.168.1.10")
        .unwrap();
    let expected = "subjectAltName=DNS:example.com,DNS:www.example.com,IP:192.168.1.10";
    assert_eq!(leaf.subject_alt_name.to_string(), expected);

    let cert = Certificate::from_pem(&fs::read_to_string(&leaf.cert_path).unwrap()).unwrap();
    assert_eq!(cert.subject_alt_name().unwrap().unwrap().to_string(), expected);
}

#[test]
fn leaf_is_signed_by_the_ca_and_serials_advance() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");
    let store = CaStore::new(dir.path(), "Test CA");
    assert!(!store.serial_path().exists());

    let issuer = TlsIssuer::new(test_config(dir.path()));
    let first = issuer.issue("Test CA", "a.local").unwrap();
    let first_serial = fs::read_to_string(store.serial_path()).unwrap();

    let root = Certificate::from_pem(&fs::read_to_string(store.ca_cert_path()).unwrap()).unwrap();
    let first_cert = Certificate::from_pem(&fs::read_to_string(&first.cert_path).unwrap()).unwrap();
    assert!(first_cert.verify_signed_by(&root).is_ok());
    assert_eq!(
        hex::encode_upper(first_cert.serial_number()),
        first_serial.trim()
    );

    // Same primary again: files are overwritten with a fresh serial.
    let second = issuer.issue("Test CA", "a.local,b.local").unwrap();
    assert_eq!(second.cert_path, first.cert_path);
    let second_serial = fs::read_to_string(store.serial_path()).unwrap();
    assert_ne!(second_serial, first_serial);

    let second_cert =
        Certificate::from_pem(&fs::read_to_string(&second.cert_path).unwrap()).unwrap();
    assert_eq!(
        hex::encode_upper(second_cert.serial_number()),
        second_serial.trim()
    );
    assert_eq!(
        second_cert.subject_alt_name().unwrap().unwrap().to_string(),
        "subjectAltName=DNS:a.local,DNS:b.local"
    );
}

#[test]
fn unwritable_key_path_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");
    let store = CaStore::new(dir.path(), "Test CA");
    // A directory where the key file should go.
    fs::create_dir(store.leaf_key_path("a.local")).unwrap();

    let result = TlsIssuer::new(test_config(dir.path())).issue("Test CA", "a.local");
    let report = Report::from_tls_result(&result);
    assert_eq!(report.status, Status::Failed);
    assert_eq!(
        report.message,
        "The TLS private key generation has failed for the FQDN (a.local)."
    );
    assert_eq!(report.exit_code(), 1);
    assert!(!store.leaf_csr_path("a.local").exists());
    assert!(!store.leaf_cert_path("a.local").exists());
    assert!(!store.serial_path().exists());
}

#[test]
fn csr_failure_keeps_the_key_and_skips_signing() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");
    let backend = ScriptedBackend::failing_at(Step::SigningRequest);

    let result = TlsIssuer::with_backend(test_config(dir.path()), backend.clone())
        .issue("Test CA", "a.local");
    assert!(matches!(
        result,
        Err(PrivCaError::ArtifactGeneration {
            artifact: Artifact::Csr,
            ..
        })
    ));
    assert_eq!(
        Report::from_tls_result(&result).message,
        "The CSR file generation has failed for the FQDN (a.local)."
    );
    assert_eq!(backend.calls(), [Step::GenerateKey, Step::SigningRequest]);

    let store = CaStore::new(dir.path(), "Test CA");
    assert!(store.leaf_key_path("a.local").exists());
    assert!(!store.leaf_csr_path("a.local").exists());
    assert!(!store.leaf_cert_path("a.local").exists());
}

#[test]
fn signing_failure_leaves_key_and_csr() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");
    let backend = ScriptedBackend::failing_at(Step::SignRequest);

    let result = TlsIssuer::with_backend(test_config(dir.path()), backend.clone())
        .issue("Test CA", "a.local");
    assert_eq!(
        Report::from_tls_result(&result).message,
        "The TLS certificate generation has failed for the FQDN (a.local)."
    );
    assert_eq!(
        backend.calls(),
        [Step::GenerateKey, Step::SigningRequest, Step::SignRequest]
    );

    let store = CaStore::new(dir.path(), "Test CA");
    assert!(store.leaf_key_path("a.local").exists());
    assert!(store.leaf_csr_path("a.local").exists());
    assert!(!store.leaf_cert_path("a.local").exists());
}

#[test]
fn out_of_range_dotted_quad_fails_at_the_csr_step() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");

    let result =
        TlsIssuer::new(test_config(dir.path())).issue("Test CA", "host.local,999.1.1.1");
    assert_eq!(
        Report::from_tls_result(&result),
        Report::failed("The CSR file generation has failed for the FQDN (host.local).")
    );
    let store = CaStore::new(dir.path(), "Test CA");
    assert!(store.leaf_key_path("host.local").exists());
    assert!(!store.leaf_csr_path("host.local").exists());
}

#[test]
fn embedded_dotted_quad_is_an_ip_entry() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");

    // "10.0.0.5.nip.io" contains a dotted quad, so it is requested as an IP
    // entry and cannot be encoded.
    let result =
        TlsIssuer::new(test_config(dir.path())).issue("Test CA", "host.local,10.0.0.5.nip.io");
    assert_eq!(
        Report::from_tls_result(&result),
        Report::failed("The CSR file generation has failed for the FQDN (host.local).")
    );
}

#[test]
fn certificate_step_fails_when_the_ca_key_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    create_ca(dir.path(), "Test CA", "Test Root");
    let store = CaStore::new(dir.path(), "Test CA");
    fs::remove_file(store.ca_key_path()).unwrap();

    let result = TlsIssuer::new(test_config(dir.path())).issue("Test CA", "a.local");
    assert_eq!(
        Report::from_tls_result(&result).message,
        "The TLS certificate generation has failed for the FQDN (a.local)."
    );
    assert!(store.leaf_csr_path("a.local").exists());
    assert!(!store.leaf_cert_path("a.local").exists());
}
