use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Filesystem,
    Etcd,
    Memory,
}

/// Serves boot and provisioning configs to bare-metal machines.
#[derive(Debug, Parser)]
#[command(name = "matchboxd", version, about = "Provides fire to your boots")]
pub struct Options {
    /// HTTP listen address
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub http_address: String,

    /// Directory of static assets to serve under /assets
    #[arg(long)]
    pub assets_path: Option<PathBuf>,

    /// Storage backend to use
    #[arg(long, value_enum, default_value = "filesystem")]
    pub store_backend: StoreBackend,

    /// Root directory for filesystem storage
    #[arg(long, default_value = "/var/lib/matchbox")]
    pub store_filesystem_root: PathBuf,

    /// Etcd endpoints for connecting
    #[arg(long, value_delimiter = ',', default_value = "127.0.0.1:2379")]
    pub store_etcd_endpoints: Vec<String>,

    /// Etcd key prefix to use
    #[arg(long, default_value = "")]
    pub store_etcd_prefix: String,

    /// Path to an Ed25519 seed used to sign responses (.sig and .asc)
    #[arg(long)]
    pub signature_key: Option<PathBuf>,

    /// Set the logging level ("debug"|"info"|"warn"|"error"); RUST_LOG overrides
    #[arg(long, short = 'l', default_value = "info")]
    pub log_level: String,
}

impl Options {
    /// Rejects configurations that cannot possibly serve.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(assets_path) = &self.assets_path {
            if !assets_path.is_dir() {
                return Err(format!("assets path {} is invalid", assets_path.display()));
            }
        }
        if self.http_address.is_empty() {
            return Err("http address must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let opts = Options::parse_from(["matchboxd"]);
        assert_eq!(opts.http_address, "127.0.0.1:8080");
        assert_eq!(opts.store_backend, StoreBackend::Filesystem);
        assert_eq!(opts.store_filesystem_root, PathBuf::from("/var/lib/matchbox"));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn etcd_endpoints_split_on_commas() {
        let opts = Options::parse_from([
            "matchboxd",
            "--store-backend",
            "etcd",
            "--store-etcd-endpoints",
            "10.0.0.1:2379,10.0.0.2:2379",
        ]);
        assert_eq!(
            opts.store_etcd_endpoints,
            vec!["10.0.0.1:2379".to_string(), "10.0.0.2:2379".to_string()]
        );
    }

    #[test]
    fn missing_assets_directory_is_rejected() {
        let opts = Options::parse_from(["matchboxd", "--assets-path", "/definitely/not/here"]);
        assert!(opts.validate().is_err());
    }
}
