#![no_main]

use std::sync::OnceLock;

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmpbug::config::AgentConfig;
use snmpbug::host::{HostInfo, HostSnapshot, StaticHost};
use snmpbug::mib::{MibStore, standard_definitions};
use snmpbug::Engine;

fn fixture() -> &'static (AgentConfig, StaticHost) {
    static FIXTURE: OnceLock<(AgentConfig, StaticHost)> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let config = AgentConfig {
            interfaces: vec!["eth0".into(), "eth1".into()],
            ..Default::default()
        };
        (config, StaticHost::new(HostSnapshot::default()))
    })
}

fuzz_target!(|data: &[u8]| {
    let (config, host) = fixture();
    let snapshot = host.snapshot(&config.interfaces, &config.disks);
    let Ok(mut mib) = MibStore::build(&standard_definitions(config, &snapshot), &snapshot) else {
        return;
    };
    let engine = Engine::new(config.clone());
    let peer = "127.0.0.1:161".parse().unwrap();

    if let Ok(Some(response)) = engine.process(&mut mib, host, Bytes::copy_from_slice(data), peer) {
        assert!(response.len() <= snmpbug::config::MAX_PACKET_SIZE);
    }
});
