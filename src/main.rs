use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use privca::ca::CaManager;
use privca::config::{Config, DEFAULT_KEY_BITS, DEFAULT_VALIDITY_DAYS};
use privca::report::Report;
use privca::tls::TlsIssuer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CertType {
    /// Create the CA key and self-signed root certificate
    CaCerts,
    /// Issue a TLS key, CSR and certificate signed by the CA
    TlsCerts,
}

/// Manages a private CA and the TLS certificates it issues.
#[derive(Debug, Parser)]
#[command(name = "privca", version)]
struct Cli {
    /// Either "ca-certs" or "tls-certs"
    #[arg(short = 't', long, alias = "cert_type", value_enum)]
    cert_type: CertType,

    /// The CA name
    #[arg(short = 'r', long, alias = "ca_name")]
    ca_name: String,

    /// The common name, or for tls-certs a comma-separated list of names
    #[arg(short = 'c', long, alias = "common_name")]
    common_name: String,

    /// Directory holding one sub-directory per CA
    #[arg(long, env = "PRIVCA_STORE_DIR", default_value = ".")]
    store_dir: PathBuf,

    /// RSA key size for new keys
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    key_bits: usize,

    /// Certificate validity in days
    #[arg(long, default_value_t = DEFAULT_VALIDITY_DAYS)]
    days: i64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ca_name = cli.ca_name.trim();
    let common_name = cli.common_name.trim();

    let config = Config::builder()
        .store_root(cli.store_dir)
        .key_bits(cli.key_bits)
        .validity_days(cli.days)
        .build();

    let report = match config.validate() {
        Err(err) => Report::failed(err.to_string()),
        Ok(()) => match cli.cert_type {
            CertType::CaCerts => {
                Report::from_ca_result(ca_name, &CaManager::new(config).ensure(ca_name, common_name))
            }
            CertType::TlsCerts => {
                Report::from_tls_result(&TlsIssuer::new(config).issue(ca_name, common_name))
            }
        },
    };

    match report.to_pretty_json() {
        Ok(json) => println!("{json}"),
        Err(err) => error!(error = %err, "could not render the result"),
    }
    ExitCode::from(report.exit_code())
}
