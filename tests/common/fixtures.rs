//! Common test fixtures and constants.

use snmpbug::host::{
    CpuStats, DiskStats, HostSnapshot, InterfaceStats, IpStats, MemoryStats, TcpStats, UdpStats,
};
use snmpbug::{AgentConfig, Oid, oid};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_object_id() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}
pub fn sys_location() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 6, 0)
}

// =============================================================================
// Subtree roots
// =============================================================================

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// ifDescr column: 1.3.6.1.2.1.2.2.1.2
pub fn if_descr_column() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}

/// ifInOctets column: 1.3.6.1.2.1.2.2.1.10
pub fn if_in_octets_column() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10)
}

/// Last ifTable cell with the two fixture interfaces: ifOutErrors.2
pub fn last_if_cell() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 20, 2)
}

/// ipForwarding.0, first entry after the interfaces group
pub fn ip_forwarding() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 4, 1, 0)
}

/// tcpCurrEstab.0
pub fn tcp_curr_estab() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 6, 9, 0)
}

/// udpOutDatagrams.0, last entry of the udp group
pub fn udp_out_datagrams() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 7, 4, 0)
}

/// hrSystemUptime.0
pub fn hr_system_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 25, 1, 1, 0)
}

/// dskPercentNode.1
pub fn dsk_percent_node() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 2021, 9, 1, 10, 1)
}

/// laLoadInt.3, last laTable cell
pub fn la_load_int_15() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 2021, 10, 1, 5, 3)
}

/// ssCpuRawUser.0
pub fn ss_cpu_raw_user() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 2021, 11, 50, 0)
}

/// ssRawContexts.0, the last entry the agent serves
pub fn ss_raw_contexts() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 2021, 11, 60, 0)
}

/// Greater than every entry the agent serves.
pub fn past_end_oid() -> Oid {
    oid!(1, 3, 6, 1, 6, 3, 1)
}

// =============================================================================
// Agent configuration
// =============================================================================

pub const COMMUNITY: &[u8] = b"public";

pub fn agent_config() -> AgentConfig {
    AgentConfig {
        description: "test".into(),
        contact: "ops@example.net".into(),
        location: "lab".into(),
        interfaces: vec!["eth0".into(), "eth1".into()],
        ..Default::default()
    }
}

pub fn host_snapshot() -> HostSnapshot {
    let iface = |name: &str, rx_bytes: u32| InterfaceStats {
        name: name.into(),
        rx_bytes,
        oper_status: 1,
        admin_status: 1,
        ..Default::default()
    };
    HostSnapshot {
        agent_uptime: 4200,
        system_uptime: 123_400,
        load: [25, 50, 100],
        memory: MemoryStats {
            total: 1_024_000,
            free: 512_000,
            ..Default::default()
        },
        cpu: CpuStats {
            user: 5000,
            idle: 90000,
            contexts: 777,
            ..Default::default()
        },
        ip: IpStats {
            forwarding: 2,
            default_ttl: 64,
            reasm_timeout: 30,
        },
        tcp: TcpStats {
            rto_algorithm: 1,
            max_conn: -1,
            curr_estab: 3,
            ..Default::default()
        },
        udp: UdpStats {
            in_datagrams: 400,
            out_datagrams: 380,
            ..Default::default()
        },
        interfaces: vec![iface("eth0", 1000), iface("eth1", 2000)],
        disks: vec![DiskStats {
            path: "/".into(),
            total: 4000,
            avail: 1000,
            used: 3000,
            percent: 75,
            inode_percent: 34,
        }],
        hostname: "testhost".into(),
        ..Default::default()
    }
}
