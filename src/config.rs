// Loads a TOML configuration file into the immutable set of providers the
// dispatcher runs with (spec section 9: "Registration is write-once").
// The shape here mirrors the constructor arguments of the original ndns
// providers (`FileProvider`, `ReverseIpv6`, `Delegation`) one-for-one.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::delegation_filter::DelegationFilter;
use crate::error::ConfigError;
use crate::provider::{Filter, Provider};
use crate::reverse_ipv6_provider::{ReverseIPv6Provider, SoaConfig};
use crate::zone_file_provider::ZoneFileProvider;

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_listen")]
    listen: String,
    #[serde(default = "default_tcp_backlog")]
    tcp_backlog: i32,
    #[serde(default = "default_work_deadline_secs")]
    work_deadline_secs: u64,
    #[serde(default)]
    zone_file: Vec<RawZoneFile>,
    #[serde(default)]
    reverse_v6: Vec<RawReverseV6>,
}

#[derive(Deserialize)]
struct RawZoneFile {
    path: PathBuf,
    origin: String,
    #[serde(default)]
    delegation: Vec<RawDelegation>,
}

#[derive(Deserialize)]
struct RawDelegation {
    zone: String,
    nameservers: Vec<String>,
    ttl: u32,
    #[serde(default)]
    glue: HashMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct RawReverseV6 {
    forward_zone: String,
    prefix: String,
    nameservers: Vec<String>,
    soa_mname: String,
    soa_rname: String,
    soa_refresh: u32,
    soa_retry: u32,
    soa_expire: u32,
    soa_minimum: u32,
    soa_ttl: u32,
}

fn default_listen() -> String {
    "[::]:53".to_string()
}

fn default_tcp_backlog() -> i32 {
    5
}

fn default_work_deadline_secs() -> u64 {
    5
}

// The output of loading a config file: everything `main` needs to start
// the dispatcher, already validated.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub tcp_backlog: i32,
    pub work_deadline: Duration,
    pub providers: Vec<Arc<dyn Provider>>,
}

pub fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let raw: RawConfig = toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

    let listen = raw
        .listen
        .parse()
        .map_err(|e| ConfigError::InvalidListenAddr(raw.listen.clone(), e))?;

    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    for zf in raw.zone_file {
        let filters = build_delegation_filters(&zf.delegation)?;
        let provider = ZoneFileProvider::load(&zf.path, &zf.origin, filters)?;
        tracing::info!(origin = %zf.origin, path = %zf.path.display(), "registered zone file provider");
        providers.push(Arc::new(provider));
    }

    for rv in raw.reverse_v6 {
        let soa = SoaConfig {
            mname: rv.soa_mname,
            rname: rv.soa_rname,
            refresh: rv.soa_refresh,
            retry: rv.soa_retry,
            expire: rv.soa_expire,
            minimum: rv.soa_minimum,
            ttl: rv.soa_ttl,
        };
        let provider = ReverseIPv6Provider::new(&rv.forward_zone, &rv.prefix, &rv.nameservers, soa, Vec::new())?;
        tracing::info!(forward_zone = %rv.forward_zone, prefix = %rv.prefix, "registered reverse ipv6 provider");
        providers.push(Arc::new(provider));
    }

    if providers.is_empty() {
        return Err(ConfigError::NoProviders);
    }

    Ok(LoadedConfig {
        listen,
        tcp_backlog: raw.tcp_backlog,
        work_deadline: Duration::from_secs(raw.work_deadline_secs),
        providers,
    })
}

fn build_delegation_filters(raw: &[RawDelegation]) -> Result<Vec<Box<dyn Filter>>, ConfigError> {
    let mut seen_zones = std::collections::HashSet::new();
    let mut filters: Vec<Box<dyn Filter>> = Vec::new();

    for delegation in raw {
        if !seen_zones.insert(delegation.zone.clone()) {
            return Err(ConfigError::DuplicateDelegationZone(delegation.zone.clone()));
        }
        let glue: Vec<(String, Vec<String>)> = delegation
            .glue
            .iter()
            .map(|(name, addrs)| (name.clone(), addrs.clone()))
            .collect();
        let filter = DelegationFilter::new(&delegation.zone, &delegation.nameservers, delegation.ttl, glue)?;
        tracing::info!(zone = %delegation.zone, "registered delegation filter");
        filters.push(Box::new(filter));
    }

    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> (tempfile_dir::TempDir, PathBuf) {
        let dir = tempfile_dir::TempDir::new();
        let path = dir.path().join("montague.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    // Minimal drop-cleanup temp dir helper; avoids pulling in the `tempfile`
    // crate just for two tests.
    mod tempfile_dir {
        use std::path::{Path, PathBuf};

        pub struct TempDir(PathBuf);

        impl TempDir {
            pub fn new() -> TempDir {
                use std::sync::atomic::{AtomicUsize, Ordering};
                static COUNTER: AtomicUsize = AtomicUsize::new(0);
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                let mut dir = std::env::temp_dir();
                dir.push(format!("montague-test-{}-{}", std::process::id(), n));
                let _ = std::fs::create_dir_all(&dir);
                TempDir(dir)
            }

            pub fn path(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }

    #[test]
    fn missing_providers_is_an_error() {
        let (_dir, path) = write_temp("listen = \"127.0.0.1:5300\"\n");
        let result = load(&path);
        assert!(matches!(result, Err(ConfigError::NoProviders)));
    }

    #[test]
    fn duplicate_delegation_zone_is_rejected() {
        let (dir, path) = write_temp(
            r#"
listen = "127.0.0.1:5300"

[[zone_file]]
path = "zone.txt"
origin = "example."

  [[zone_file.delegation]]
  zone = "sub.example."
  nameservers = ["ns1.sub.example."]
  ttl = 7200

  [[zone_file.delegation]]
  zone = "sub.example."
  nameservers = ["ns2.sub.example."]
  ttl = 7200
"#,
        );
        let zone_path = dir.path().join("zone.txt");
        std::fs::write(&zone_path, "example. 3600 IN SOA ns1.example. hostmaster.example. 1 3600 600 604800 300\n").unwrap();

        let result = load(&path);
        assert!(matches!(result, Err(ConfigError::DuplicateDelegationZone(_))));
    }

    #[test]
    fn loads_a_reverse_v6_only_config() {
        let (_dir, path) = write_temp(
            r#"
listen = "127.0.0.1:5300"

[[reverse_v6]]
forward_zone = "v6.example."
prefix = "2001:db8::"
nameservers = ["ns1.example."]
soa_mname = "ns1.example."
soa_rname = "hostmaster.example."
soa_refresh = 3600
soa_retry = 600
soa_expire = 604800
soa_minimum = 300
soa_ttl = 3600
"#,
        );
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.providers.len(), 1);
        assert_eq!(loaded.tcp_backlog, 5);
        assert_eq!(loaded.work_deadline, Duration::from_secs(5));
    }
}
