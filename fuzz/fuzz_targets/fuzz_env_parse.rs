#![no_main]

use hxcomm_context::env::{
    parse_ip_list, parse_loglevel, BackendSelection, Environment, FPGA_IPS_VAR,
    QUIGGELDY_ENABLED_VAR, QUIGGELDY_IP_VAR, QUIGGELDY_PORT_VAR, SIM_HOST_VAR, SIM_PORT_VAR,
};
use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

#[derive(Debug)]
struct EnvInput {
    fpga_ips: Option<String>,
    sim_host: Option<String>,
    sim_port: Option<String>,
    quiggeldy_enabled: bool,
    quiggeldy_ip: Option<String>,
    quiggeldy_port: Option<String>,
    loglevel: String,
    limit: Option<u8>,
}

impl<'a> Arbitrary<'a> for EnvInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> libfuzzer_sys::arbitrary::Result<Self> {
        Ok(Self {
            fpga_ips: u.arbitrary()?,
            sim_host: u.arbitrary()?,
            sim_port: u.arbitrary()?,
            quiggeldy_enabled: u.arbitrary()?,
            quiggeldy_ip: u.arbitrary()?,
            quiggeldy_port: u.arbitrary()?,
            loglevel: u.arbitrary()?,
            limit: u.arbitrary()?,
        })
    }
}

fuzz_target!(|input: EnvInput| {
    let mut env = Environment::default();
    let vars = [
        (FPGA_IPS_VAR, &input.fpga_ips),
        (SIM_HOST_VAR, &input.sim_host),
        (SIM_PORT_VAR, &input.sim_port),
        (QUIGGELDY_IP_VAR, &input.quiggeldy_ip),
        (QUIGGELDY_PORT_VAR, &input.quiggeldy_port),
    ];
    for (key, value) in vars {
        if let Some(value) = value {
            env.set(key, value.as_str());
        }
    }
    if input.quiggeldy_enabled {
        env.set(QUIGGELDY_ENABLED_VAR, "1");
    }

    if let Some(ips) = &input.fpga_ips {
        assert!(parse_ip_list(ips).iter().all(|ip| !ip.is_empty()));
    }
    if let Some(level) = parse_loglevel(&input.loglevel) {
        let _ = hxcomm_context::env::level_filter(level);
    }

    // Selection may fail but must never panic, and a list is consistent
    // with the single pick
    let single = env.select_backend();
    if let Ok(list) = env.select_backends(input.limit.map(usize::from)) {
        assert!(input.limit.map_or(true, |limit| list.len() <= limit as usize));
        if let (Ok(single), Some(first)) = (&single, list.first()) {
            match (single, first) {
                (BackendSelection::Quiggeldy(a), BackendSelection::Quiggeldy(b)) => {
                    assert_eq!(a, b)
                }
                (BackendSelection::Simulation(a), BackendSelection::Simulation(b)) => {
                    assert_eq!(a, b)
                }
                (BackendSelection::Hardware { ip: a }, BackendSelection::Hardware { ip: b }) => {
                    assert_eq!(a, b)
                }
                (single, first) => panic!("selection mismatch: {:?} vs {:?}", single, first),
            }
        }
    }
});
