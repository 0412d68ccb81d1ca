use std::env;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts},
};

use super::model::StressConfig;
use crate::cli::Args;
use crate::http_probe::resolver::lookup_timeout;
use crate::error::{Error, Result};

const DEFAULT_CONFIG_FILE: &str = "config.yml";

pub struct AppConfig {
    pub config: StressConfig,
    /// The config file that was read, if any.
    pub source: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

/// Load the application configuration.
///
/// Precedence, lowest first: built-in defaults, the YAML file named by `--config` or
/// `CONFIG_FILE` (default `config.yml`), environment variables (`DATASET_FILE`,
/// `DNS_HOSTS`, `BLOCKPROBE_LOG`), then command-line arguments.
/// A missing config file means defaults; a file that does not parse is an error.
pub fn load_config(args: &Args) -> Result<AppConfig> {
    let config_file_location = args
        .config
        .clone()
        .or_else(|| env::var_os("CONFIG_FILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let (mut config, source) = match std::fs::read_to_string(&config_file_location) {
        Ok(config_str) => {
            let config: StressConfig = serde_yaml::from_str(&config_str).map_err(|source| Error::Config {
                path: config_file_location.clone(),
                source,
            })?;
            (config, Some(config_file_location))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => (StressConfig::default(), None),
        Err(e) => return Err(e.into()),
    };

    apply_env(&mut config, |key| env::var(key).ok());
    apply_args(&mut config, args);

    Ok(AppConfig {
        config,
        source,
        summary_json: args.summary_json.clone(),
    })
}

fn apply_env(config: &mut StressConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(dataset) = lookup("DATASET_FILE") {
        config.dataset_file = PathBuf::from(dataset);
    }
    if let Some(dns_hosts) = lookup("DNS_HOSTS") {
        config.dns_hosts = dns_hosts
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(level) = lookup("BLOCKPROBE_LOG") {
        config.log_level = level;
    }
}

fn apply_args(config: &mut StressConfig, args: &Args) {
    if let Some(dataset) = &args.dataset {
        config.dataset_file = dataset.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(loops) = args.loops {
        config.loops = loops;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_seconds = timeout;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
}

/// Resolver options whose retries all fit in the lookup timeout of a probe.
fn resolver_opts(probe_timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    // One retry after the first query.
    opts.attempts = 1;
    opts.timeout = lookup_timeout(probe_timeout) / 2;
    opts.cache_size = 1024;
    opts
}

/// Setup a DNS resolver for the probes.
///
/// With no `dns_hosts` the system configuration is used. Otherwise the given hosts are
/// queried over TCP.
pub fn setup_resolver(dns_hosts: &[String], probe_timeout: Duration) -> Result<TokioAsyncResolver> {
    let opts = resolver_opts(probe_timeout);

    if dns_hosts.is_empty() {
        let (resolver_config, mut system_opts) = trust_dns_resolver::system_conf::read_system_conf()?;
        system_opts.attempts = opts.attempts;
        system_opts.timeout = opts.timeout;
        system_opts.cache_size = opts.cache_size;
        return Ok(TokioAsyncResolver::tokio(resolver_config, system_opts));
    }

    let mut name_servers = NameServerConfigGroup::new();
    for host in dns_hosts {
        let ip: IpAddr = host.parse().map_err(|source| Error::DnsHost {
            host: host.clone(),
            source,
        })?;
        name_servers.push(NameServerConfig {
            socket_addr: (ip, 53).into(),
            protocol: Protocol::Tcp,
            tls_dns_name: None,
            trust_negative_responses: false,
            bind_addr: None,
        });
    }

    let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}
