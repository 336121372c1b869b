//! Connection parameters from the environment
//!
//! Recognised variables:
//! * `SLURM_FPGA_IPS` - comma-separated list of allocated FPGAs
//! * `FLANGE_SIMULATION_RCF_HOST` / `FLANGE_SIMULATION_RCF_PORT` - simulator
//! * `QUIGGELDY_ENABLED` / `QUIGGELDY_IP` / `QUIGGELDY_PORT` - scheduling daemon
//! * `QUIGGELDY_LOGLEVEL` - log level of daemon-related tooling
//!
//! When several backends are configured, Quiggeldy wins over hardware, which
//! wins over simulation.

use crate::connection::Endpoint;
use crate::{Error, Result};
use std::collections::HashMap;
use tracing::level_filters::LevelFilter;

/// Variable holding the comma-separated FPGA IPs
pub const FPGA_IPS_VAR: &str = "SLURM_FPGA_IPS";
/// Variable holding the simulator host
pub const SIM_HOST_VAR: &str = "FLANGE_SIMULATION_RCF_HOST";
/// Variable holding the simulator port
pub const SIM_PORT_VAR: &str = "FLANGE_SIMULATION_RCF_PORT";
/// Variable whose presence enables Quiggeldy
pub const QUIGGELDY_ENABLED_VAR: &str = "QUIGGELDY_ENABLED";
/// Variable holding the Quiggeldy host
pub const QUIGGELDY_IP_VAR: &str = "QUIGGELDY_IP";
/// Variable holding the Quiggeldy port
pub const QUIGGELDY_PORT_VAR: &str = "QUIGGELDY_PORT";
/// Variable holding the log level
pub const QUIGGELDY_LOGLEVEL_VAR: &str = "QUIGGELDY_LOGLEVEL";

/// Host used when the environment names none
pub const DEFAULT_HOST: &str = "127.0.0.1";

const LOGLEVEL_NAMES: [&str; 6] = ["trace", "debug", "info", "warning", "error", "fatal"];

/// Backend chosen from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelection {
    /// Quiggeldy daemon
    Quiggeldy(Endpoint),
    /// FPGA via HostARQ
    Hardware {
        /// FPGA IP address
        ip: String,
    },
    /// Simulator
    Simulation(Endpoint),
}

/// Snapshot of environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    ///
    /// Variables that are not valid unicode are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Build an environment from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set a variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Remove a variable
    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }

    /// Value of a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All FPGA IPs listed in the environment, in order
    pub fn fpga_ip_list(&self) -> Vec<String> {
        self.get(FPGA_IPS_VAR)
            .map(parse_ip_list)
            .unwrap_or_default()
    }

    /// The single FPGA IP listed in the environment
    pub fn fpga_ip(&self) -> Result<String> {
        let mut ips = self.fpga_ip_list();
        match ips.len() {
            0 => Err(Error::Environment(format!(
                "no FPGA IP found in environment ({})",
                FPGA_IPS_VAR
            ))),
            1 => Ok(ips.remove(0)),
            _ => Err(Error::Environment(format!(
                "more than one FPGA IP found in environment ({})",
                FPGA_IPS_VAR
            ))),
        }
    }

    /// Simulator endpoint from the environment
    pub fn sim_parameters(&self) -> Result<Endpoint> {
        let port = self.get(SIM_PORT_VAR).ok_or_else(|| {
            Error::Environment(format!(
                "no simulator parameters found in environment ({})",
                SIM_PORT_VAR
            ))
        })?;
        let host = self.get(SIM_HOST_VAR).unwrap_or(DEFAULT_HOST);
        Ok(Endpoint::new(host, parse_port(SIM_PORT_VAR, port)?))
    }

    /// Quiggeldy endpoint, or `None` if Quiggeldy is not enabled
    pub fn quiggeldy_parameters(&self) -> Result<Option<Endpoint>> {
        if self.get(QUIGGELDY_ENABLED_VAR).is_none() {
            return Ok(None);
        }
        let port = self.get(QUIGGELDY_PORT_VAR).ok_or_else(|| {
            Error::Environment(format!(
                "Quiggeldy enabled but {} is not set",
                QUIGGELDY_PORT_VAR
            ))
        })?;
        let host = self.get(QUIGGELDY_IP_VAR).unwrap_or(DEFAULT_HOST);
        Ok(Some(Endpoint::new(
            host,
            parse_port(QUIGGELDY_PORT_VAR, port)?,
        )))
    }

    /// Numeric log level from `var`.
    ///
    /// Accepts a plain integer or one of `trace`, `debug`, `info`, `warning`,
    /// `error`, `fatal` (0 to 5). Anything else is ignored with a warning.
    pub fn loglevel(&self, var: &str) -> Option<usize> {
        let value = self.get(var)?;
        let level = parse_loglevel(value);
        if level.is_none() {
            tracing::warn!(
                var,
                value,
                "log level has to be an integer or one of {{trace,debug,info,warning,error,fatal}}"
            );
        }
        level
    }

    /// Pick the backend to connect to
    pub fn select_backend(&self) -> Result<BackendSelection> {
        if let Some(endpoint) = self.quiggeldy_parameters()? {
            return Ok(BackendSelection::Quiggeldy(endpoint));
        }
        if !self.fpga_ip_list().is_empty() {
            return Ok(BackendSelection::Hardware {
                ip: self.fpga_ip()?,
            });
        }
        if self.get(SIM_PORT_VAR).is_some() {
            return Ok(BackendSelection::Simulation(self.sim_parameters()?));
        }
        Err(Error::Environment(format!(
            "no connection found in environment (set {}, {} or {})",
            QUIGGELDY_ENABLED_VAR, FPGA_IPS_VAR, SIM_PORT_VAR
        )))
    }

    /// Pick backends for a list of connections.
    ///
    /// Hardware yields one entry per listed FPGA; Quiggeldy and simulation
    /// yield a single entry. `limit` truncates the list.
    pub fn select_backends(&self, limit: Option<usize>) -> Result<Vec<BackendSelection>> {
        let mut selections = match self.quiggeldy_parameters()? {
            Some(endpoint) => vec![BackendSelection::Quiggeldy(endpoint)],
            None => {
                let ips = self.fpga_ip_list();
                if !ips.is_empty() {
                    ips.into_iter()
                        .map(|ip| BackendSelection::Hardware { ip })
                        .collect()
                } else {
                    vec![self.select_backend()?]
                }
            }
        };
        if let Some(limit) = limit {
            selections.truncate(limit);
        }
        Ok(selections)
    }
}

/// Split a comma-separated IP list, skipping empty entries
pub fn parse_ip_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a log level given by name or number.
///
/// Numbers beyond `usize` saturate to `usize::MAX`.
pub fn parse_loglevel(value: &str) -> Option<usize> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        // only overflow can fail here; anything that large is the highest level
        return Some(value.parse().unwrap_or(usize::MAX));
    }
    LOGLEVEL_NAMES.iter().position(|name| *name == value)
}

/// Map a numeric log level to a tracing filter
pub fn level_filter(level: usize) -> LevelFilter {
    match level {
        0 => LevelFilter::TRACE,
        1 => LevelFilter::DEBUG,
        2 => LevelFilter::INFO,
        3 => LevelFilter::WARN,
        _ => LevelFilter::ERROR,
    }
}

fn parse_port(var: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Environment(format!("invalid port in {}: {:?}", var, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_list() {
        assert_eq!(parse_ip_list("10.0.0.1"), vec!["10.0.0.1"]);
        assert_eq!(
            parse_ip_list("10.0.0.1,10.0.0.2"),
            vec!["10.0.0.1", "10.0.0.2"]
        );
        assert_eq!(parse_ip_list("10.0.0.1, ,10.0.0.2,"), vec!["10.0.0.1", "10.0.0.2"]);
        assert!(parse_ip_list("").is_empty());
    }

    #[test]
    fn test_fpga_ip_single() {
        let env = Environment::from_pairs([(FPGA_IPS_VAR, "192.168.4.11")]);
        assert_eq!(env.fpga_ip().unwrap(), "192.168.4.11");
    }

    #[test]
    fn test_fpga_ip_missing_or_ambiguous() {
        let empty = Environment::default();
        assert!(empty.fpga_ip_list().is_empty());
        assert!(empty.fpga_ip().unwrap_err().to_string().contains("no FPGA IP"));

        let two = Environment::from_pairs([(FPGA_IPS_VAR, "10.0.0.1,10.0.0.2")]);
        assert!(two.fpga_ip().unwrap_err().to_string().contains("more than one"));
    }

    #[test]
    fn test_sim_parameters_default_host() {
        let env = Environment::from_pairs([(SIM_PORT_VAR, "50051")]);
        assert_eq!(
            env.sim_parameters().unwrap(),
            Endpoint::new(DEFAULT_HOST, 50051)
        );
    }

    #[test]
    fn test_sim_parameters_explicit_host() {
        let env = Environment::from_pairs([(SIM_HOST_VAR, "sim.local"), (SIM_PORT_VAR, "7")]);
        assert_eq!(env.sim_parameters().unwrap(), Endpoint::new("sim.local", 7));
    }

    #[test]
    fn test_sim_parameters_invalid_port() {
        let env = Environment::from_pairs([(SIM_PORT_VAR, "not-a-port")]);
        assert!(matches!(env.sim_parameters(), Err(Error::Environment(_))));

        let env = Environment::from_pairs([(SIM_PORT_VAR, "70000")]);
        assert!(env.sim_parameters().is_err());
    }

    #[test]
    fn test_quiggeldy_disabled_by_default() {
        let env = Environment::from_pairs([(QUIGGELDY_PORT_VAR, "1234")]);
        assert_eq!(env.quiggeldy_parameters().unwrap(), None);
    }

    #[test]
    fn test_quiggeldy_enabled() {
        let env = Environment::from_pairs([
            (QUIGGELDY_ENABLED_VAR, "1"),
            (QUIGGELDY_IP_VAR, "10.1.1.1"),
            (QUIGGELDY_PORT_VAR, "5666"),
        ]);
        assert_eq!(
            env.quiggeldy_parameters().unwrap(),
            Some(Endpoint::new("10.1.1.1", 5666))
        );
    }

    #[test]
    fn test_quiggeldy_enabled_without_port() {
        let env = Environment::from_pairs([(QUIGGELDY_ENABLED_VAR, "1")]);
        assert!(env.quiggeldy_parameters().is_err());
    }

    #[test]
    fn test_parse_loglevel() {
        assert_eq!(parse_loglevel("trace"), Some(0));
        assert_eq!(parse_loglevel("warning"), Some(3));
        assert_eq!(parse_loglevel("fatal"), Some(5));
        assert_eq!(parse_loglevel("4"), Some(4));
        assert_eq!(parse_loglevel("warn"), None);
        assert_eq!(
            parse_loglevel("99999999999999999999999999"),
            Some(usize::MAX)
        );
        assert_eq!(level_filter(usize::MAX), LevelFilter::ERROR);
        assert_eq!(parse_loglevel(""), None);
    }

    #[test]
    fn test_loglevel_from_environment() {
        let env = Environment::from_pairs([(QUIGGELDY_LOGLEVEL_VAR, "debug")]);
        assert_eq!(env.loglevel(QUIGGELDY_LOGLEVEL_VAR), Some(1));
        assert_eq!(env.loglevel("UNSET_LOGLEVEL"), None);
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(0), LevelFilter::TRACE);
        assert_eq!(level_filter(3), LevelFilter::WARN);
        assert_eq!(level_filter(5), LevelFilter::ERROR);
    }

    #[test]
    fn test_select_backend_precedence() {
        let mut env = Environment::from_pairs([
            (QUIGGELDY_ENABLED_VAR, "1"),
            (QUIGGELDY_PORT_VAR, "5666"),
            (FPGA_IPS_VAR, "10.0.0.1"),
            (SIM_PORT_VAR, "50051"),
        ]);
        assert_eq!(
            env.select_backend().unwrap(),
            BackendSelection::Quiggeldy(Endpoint::new(DEFAULT_HOST, 5666))
        );

        env.remove(QUIGGELDY_ENABLED_VAR);
        assert_eq!(
            env.select_backend().unwrap(),
            BackendSelection::Hardware {
                ip: "10.0.0.1".into()
            }
        );

        env.remove(FPGA_IPS_VAR);
        assert_eq!(
            env.select_backend().unwrap(),
            BackendSelection::Simulation(Endpoint::new(DEFAULT_HOST, 50051))
        );

        env.remove(SIM_PORT_VAR);
        assert!(matches!(env.select_backend(), Err(Error::Environment(_))));
    }

    #[test]
    fn test_select_backends_one_per_fpga() {
        let env = Environment::from_pairs([(FPGA_IPS_VAR, "10.0.0.1,10.0.0.2,10.0.0.3")]);
        let all = env.select_backends(None).unwrap();
        assert_eq!(all.len(), 3);

        let limited = env.select_backends(Some(2)).unwrap();
        assert_eq!(
            limited,
            vec![
                BackendSelection::Hardware {
                    ip: "10.0.0.1".into()
                },
                BackendSelection::Hardware {
                    ip: "10.0.0.2".into()
                },
            ]
        );
    }

    #[test]
    fn test_set_overrides_value() {
        let mut env = Environment::from_pairs([(SIM_PORT_VAR, "1")]);
        env.set(SIM_PORT_VAR, "2");
        assert_eq!(env.get(SIM_PORT_VAR), Some("2"));
    }
}
