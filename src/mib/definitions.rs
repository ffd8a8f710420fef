//! Declarative description of the exported MIB.
//!
//! Each [`Definition`] names one scalar or one table column. The list
//! returned by [`standard_definitions`] is in ascending OID order, columns
//! ascending within each table, rows ascending within each column.

use bytes::Bytes;

use crate::ber::tag;
use crate::config::AgentConfig;
use crate::host::{HostSnapshot, InterfaceStats};
use crate::oid::Oid;
use crate::value::Value;

/// Where a cell's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Encoded once at build time.
    Fixed(Value),
    /// Re-sampled from the host on every refresh.
    Metric(Metric),
}

/// Rows of a definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    /// A single instance at `.column.0`.
    Scalar(Cell),
    /// Instances at `.column.1` through `.column.n`.
    Table(Vec<Cell>),
}

/// One scalar or table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub prefix: Oid,
    pub column: u32,
    /// BER type every cell must have.
    pub tag: u8,
    pub rows: Rows,
}

impl Definition {
    pub fn scalar(prefix: &Oid, column: u32, tag: u8, cell: Cell) -> Self {
        Self {
            prefix: prefix.clone(),
            column,
            tag,
            rows: Rows::Scalar(cell),
        }
    }

    pub fn table(prefix: &Oid, column: u32, tag: u8, cells: Vec<Cell>) -> Self {
        Self {
            prefix: prefix.clone(),
            column,
            tag,
            rows: Rows::Table(cells),
        }
    }

    /// Instance OIDs paired with their cells, in row order.
    pub fn instances(&self) -> Vec<(Oid, &Cell)> {
        match &self.rows {
            Rows::Scalar(cell) => vec![(self.prefix.join(&[self.column, 0]), cell)],
            Rows::Table(cells) => cells
                .iter()
                .enumerate()
                .map(|(row, cell)| (self.prefix.join(&[self.column, row as u32 + 1]), cell))
                .collect(),
        }
    }
}

/// A host figure behind a dynamic cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    AgentUptime,
    SystemUptime,
    Memory(MemoryField),
    /// Row index (0-based) into the configured interfaces.
    Interface(usize, InterfaceField),
    /// Row index (0-based) into the configured disks.
    Disk(usize, DiskField),
    /// 0 = 1 minute, 1 = 5 minutes, 2 = 15 minutes.
    Load(usize, LoadField),
    Ip(IpField),
    Tcp(TcpField),
    Udp(UdpField),
    Cpu(CpuField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryField {
    Total,
    Free,
    Shared,
    Buffers,
    Cached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceField {
    AdminStatus,
    OperStatus,
    InOctets,
    InUcastPkts,
    InDiscards,
    InErrors,
    OutOctets,
    OutUcastPkts,
    OutDiscards,
    OutErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskField {
    Total,
    Avail,
    Used,
    Percent,
    PercentNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpField {
    Forwarding,
    DefaultTtl,
    ReasmTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpField {
    RtoAlgorithm,
    RtoMin,
    RtoMax,
    MaxConn,
    ActiveOpens,
    PassiveOpens,
    AttemptFails,
    EstabResets,
    CurrEstab,
    InSegs,
    OutSegs,
    RetransSegs,
    InErrs,
    OutRsts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdpField {
    InDatagrams,
    NoPorts,
    InErrors,
    OutDatagrams,
}

/// UCD-SNMP systemStats raw counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuField {
    User,
    Nice,
    System,
    Idle,
    Interrupts,
    Contexts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadField {
    /// laLoad, e.g. "0.52"
    Text,
    /// laLoadInt, hundredths
    Integer,
}

impl Metric {
    /// Read this figure from `snapshot`. Rows missing from the snapshot read
    /// as zero.
    pub fn sample(&self, snapshot: &HostSnapshot) -> Value {
        match *self {
            Metric::AgentUptime => Value::TimeTicks(snapshot.agent_uptime),
            Metric::SystemUptime => Value::TimeTicks(snapshot.system_uptime),
            Metric::Memory(field) => {
                let memory = &snapshot.memory;
                let kb = match field {
                    MemoryField::Total => memory.total,
                    MemoryField::Free => memory.free,
                    MemoryField::Shared => memory.shared,
                    MemoryField::Buffers => memory.buffers,
                    MemoryField::Cached => memory.cached,
                };
                Value::Integer(clamp_i32(kb))
            }
            Metric::Interface(row, field) => {
                let default = InterfaceStats::default();
                let stats = snapshot.interfaces.get(row).unwrap_or(&default);
                match field {
                    InterfaceField::AdminStatus => Value::Integer(stats.admin_status),
                    InterfaceField::OperStatus => Value::Integer(stats.oper_status),
                    InterfaceField::InOctets => Value::Counter32(stats.rx_bytes),
                    InterfaceField::InUcastPkts => Value::Counter32(stats.rx_packets),
                    InterfaceField::InDiscards => Value::Counter32(stats.rx_drops),
                    InterfaceField::InErrors => Value::Counter32(stats.rx_errors),
                    InterfaceField::OutOctets => Value::Counter32(stats.tx_bytes),
                    InterfaceField::OutUcastPkts => Value::Counter32(stats.tx_packets),
                    InterfaceField::OutDiscards => Value::Counter32(stats.tx_drops),
                    InterfaceField::OutErrors => Value::Counter32(stats.tx_errors),
                }
            }
            Metric::Disk(row, field) => {
                let disk = snapshot.disks.get(row);
                Value::Integer(match (disk, field) {
                    (None, _) => 0,
                    (Some(d), DiskField::Total) => clamp_i32(d.total),
                    (Some(d), DiskField::Avail) => clamp_i32(d.avail),
                    (Some(d), DiskField::Used) => clamp_i32(d.used),
                    (Some(d), DiskField::Percent) => d.percent,
                    (Some(d), DiskField::PercentNode) => d.inode_percent,
                })
            }
            Metric::Load(slot, field) => {
                let load = snapshot.load.get(slot).copied().unwrap_or(0);
                match field {
                    LoadField::Text => Value::from(format!("{}.{:02}", load / 100, load % 100)),
                    LoadField::Integer => Value::Integer(clamp_i32(load)),
                }
            }
            Metric::Ip(field) => {
                let ip = &snapshot.ip;
                Value::Integer(match field {
                    IpField::Forwarding => ip.forwarding,
                    IpField::DefaultTtl => ip.default_ttl,
                    IpField::ReasmTimeout => ip.reasm_timeout,
                })
            }
            Metric::Tcp(field) => {
                let tcp = &snapshot.tcp;
                match field {
                    TcpField::RtoAlgorithm => Value::Integer(tcp.rto_algorithm),
                    TcpField::RtoMin => Value::Integer(tcp.rto_min),
                    TcpField::RtoMax => Value::Integer(tcp.rto_max),
                    TcpField::MaxConn => Value::Integer(tcp.max_conn),
                    TcpField::ActiveOpens => Value::Counter32(tcp.active_opens),
                    TcpField::PassiveOpens => Value::Counter32(tcp.passive_opens),
                    TcpField::AttemptFails => Value::Counter32(tcp.attempt_fails),
                    TcpField::EstabResets => Value::Counter32(tcp.estab_resets),
                    TcpField::CurrEstab => Value::Gauge32(tcp.curr_estab),
                    TcpField::InSegs => Value::Counter32(tcp.in_segs),
                    TcpField::OutSegs => Value::Counter32(tcp.out_segs),
                    TcpField::RetransSegs => Value::Counter32(tcp.retrans_segs),
                    TcpField::InErrs => Value::Counter32(tcp.in_errs),
                    TcpField::OutRsts => Value::Counter32(tcp.out_rsts),
                }
            }
            Metric::Udp(field) => {
                let udp = &snapshot.udp;
                Value::Counter32(match field {
                    UdpField::InDatagrams => udp.in_datagrams,
                    UdpField::NoPorts => udp.no_ports,
                    UdpField::InErrors => udp.in_errors,
                    UdpField::OutDatagrams => udp.out_datagrams,
                })
            }
            Metric::Cpu(field) => {
                let cpu = &snapshot.cpu;
                Value::Counter32(match field {
                    CpuField::User => cpu.user,
                    CpuField::Nice => cpu.nice,
                    CpuField::System => cpu.system,
                    CpuField::Idle => cpu.idle,
                    CpuField::Interrupts => cpu.interrupts,
                    CpuField::Contexts => cpu.contexts,
                })
            }
        }
    }

    /// BER type of the values [`sample`](Self::sample) yields.
    pub fn tag(&self) -> u8 {
        match self {
            Metric::AgentUptime | Metric::SystemUptime => tag::application::TIMETICKS,
            Metric::Interface(_, InterfaceField::AdminStatus | InterfaceField::OperStatus) => {
                tag::universal::INTEGER
            }
            Metric::Interface(..) => tag::application::COUNTER32,
            Metric::Load(_, LoadField::Text) => tag::universal::OCTET_STRING,
            Metric::Memory(_)
            | Metric::Disk(..)
            | Metric::Load(_, LoadField::Integer)
            | Metric::Ip(_)
            | Metric::Tcp(
                TcpField::RtoAlgorithm | TcpField::RtoMin | TcpField::RtoMax | TcpField::MaxConn,
            ) => tag::universal::INTEGER,
            Metric::Tcp(TcpField::CurrEstab) => tag::application::GAUGE32,
            Metric::Tcp(_) | Metric::Udp(_) | Metric::Cpu(_) => tag::application::COUNTER32,
        }
    }
}

fn clamp_i32(v: u32) -> i32 {
    v.min(i32::MAX as u32) as i32
}

fn fixed(value: impl Into<Value>) -> Cell {
    Cell::Fixed(value.into())
}

fn per_interface(
    ifaces: &[(String, &InterfaceStats)],
    f: impl Fn(&str, &InterfaceStats) -> Value,
) -> Vec<Cell> {
    ifaces
        .iter()
        .map(|(name, stats)| Cell::Fixed(f(name, stats)))
        .collect()
}

/// The agent's MIB: system, interfaces, ip, tcp, udp, host resources and
/// UCD-SNMP groups.
///
/// Table sizes follow the configured interface and disk lists; fixed cells
/// (descriptions, sizes, addresses) take their value from `snapshot`.
pub fn standard_definitions(config: &AgentConfig, snapshot: &HostSnapshot) -> Vec<Definition> {
    use tag::application::{COUNTER32, GAUGE32, TIMETICKS};
    use tag::universal::{INTEGER, OBJECT_IDENTIFIER, OCTET_STRING};

    let system = crate::oid!(1, 3, 6, 1, 2, 1, 1);
    let interfaces = crate::oid!(1, 3, 6, 1, 2, 1, 2);
    let if_entry = crate::oid!(1, 3, 6, 1, 2, 1, 2, 2, 1);
    let ip = crate::oid!(1, 3, 6, 1, 2, 1, 4);
    let tcp = crate::oid!(1, 3, 6, 1, 2, 1, 6);
    let udp = crate::oid!(1, 3, 6, 1, 2, 1, 7);
    let hr_system = crate::oid!(1, 3, 6, 1, 2, 1, 25, 1);
    let ucd_memory = crate::oid!(1, 3, 6, 1, 4, 1, 2021, 4);
    let dsk_entry = crate::oid!(1, 3, 6, 1, 4, 1, 2021, 9, 1);
    let la_entry = crate::oid!(1, 3, 6, 1, 4, 1, 2021, 10, 1);
    let system_stats = crate::oid!(1, 3, 6, 1, 4, 1, 2021, 11);

    let default_if = InterfaceStats::default();
    let ifaces: Vec<(String, &InterfaceStats)> = config
        .interfaces
        .iter()
        .enumerate()
        .map(|(row, name)| (name.clone(), snapshot.interfaces.get(row).unwrap_or(&default_if)))
        .collect();
    let if_metric = |field: InterfaceField| -> Vec<Cell> {
        (0..ifaces.len())
            .map(|row| Cell::Metric(Metric::Interface(row, field)))
            .collect()
    };
    let disk_metric = |field: DiskField| -> Vec<Cell> {
        (0..config.disks.len())
            .map(|row| Cell::Metric(Metric::Disk(row, field)))
            .collect()
    };
    let rows = |n: usize| -> Vec<Cell> { (1..=n).map(|i| fixed(i as i32)).collect() };
    let memory = |field| Cell::Metric(Metric::Memory(field));
    let loads = |field| -> Vec<Cell> {
        (0..3).map(|i| Cell::Metric(Metric::Load(i, field))).collect()
    };
    let tcp_metric = |field| Cell::Metric(Metric::Tcp(field));
    let udp_metric = |field| Cell::Metric(Metric::Udp(field));
    let cpu_metric = |field| Cell::Metric(Metric::Cpu(field));

    vec![
        // system
        Definition::scalar(&system, 1, OCTET_STRING, fixed(config.description.as_str())),
        Definition::scalar(&system, 2, OBJECT_IDENTIFIER, fixed(config.vendor.clone())),
        Definition::scalar(&system, 3, TIMETICKS, Cell::Metric(Metric::AgentUptime)),
        Definition::scalar(&system, 4, OCTET_STRING, fixed(config.contact.as_str())),
        Definition::scalar(&system, 5, OCTET_STRING, fixed(snapshot.hostname.as_str())),
        Definition::scalar(&system, 6, OCTET_STRING, fixed(config.location.as_str())),
        // interfaces
        Definition::scalar(&interfaces, 1, INTEGER, fixed(ifaces.len() as i32)),
        Definition::table(&if_entry, 1, INTEGER, rows(ifaces.len())),
        Definition::table(
            &if_entry,
            2,
            OCTET_STRING,
            per_interface(&ifaces, |name, _| Value::from(name)),
        ),
        Definition::table(
            &if_entry,
            3,
            INTEGER,
            per_interface(&ifaces, |_, s| Value::Integer(s.if_type)),
        ),
        Definition::table(
            &if_entry,
            4,
            INTEGER,
            per_interface(&ifaces, |_, s| Value::Integer(s.mtu)),
        ),
        Definition::table(
            &if_entry,
            5,
            GAUGE32,
            per_interface(&ifaces, |_, s| Value::Gauge32(s.speed)),
        ),
        Definition::table(
            &if_entry,
            6,
            OCTET_STRING,
            per_interface(&ifaces, |_, s| {
                Value::OctetString(Bytes::copy_from_slice(&s.phys_address))
            }),
        ),
        Definition::table(&if_entry, 7, INTEGER, if_metric(InterfaceField::AdminStatus)),
        Definition::table(&if_entry, 8, INTEGER, if_metric(InterfaceField::OperStatus)),
        Definition::table(&if_entry, 10, COUNTER32, if_metric(InterfaceField::InOctets)),
        Definition::table(&if_entry, 11, COUNTER32, if_metric(InterfaceField::InUcastPkts)),
        Definition::table(&if_entry, 13, COUNTER32, if_metric(InterfaceField::InDiscards)),
        Definition::table(&if_entry, 14, COUNTER32, if_metric(InterfaceField::InErrors)),
        Definition::table(&if_entry, 16, COUNTER32, if_metric(InterfaceField::OutOctets)),
        Definition::table(&if_entry, 17, COUNTER32, if_metric(InterfaceField::OutUcastPkts)),
        Definition::table(&if_entry, 19, COUNTER32, if_metric(InterfaceField::OutDiscards)),
        Definition::table(&if_entry, 20, COUNTER32, if_metric(InterfaceField::OutErrors)),
        // ip
        Definition::scalar(&ip, 1, INTEGER, Cell::Metric(Metric::Ip(IpField::Forwarding))),
        Definition::scalar(&ip, 2, INTEGER, Cell::Metric(Metric::Ip(IpField::DefaultTtl))),
        Definition::scalar(&ip, 13, INTEGER, Cell::Metric(Metric::Ip(IpField::ReasmTimeout))),
        // tcp
        Definition::scalar(&tcp, 1, INTEGER, tcp_metric(TcpField::RtoAlgorithm)),
        Definition::scalar(&tcp, 2, INTEGER, tcp_metric(TcpField::RtoMin)),
        Definition::scalar(&tcp, 3, INTEGER, tcp_metric(TcpField::RtoMax)),
        Definition::scalar(&tcp, 4, INTEGER, tcp_metric(TcpField::MaxConn)),
        Definition::scalar(&tcp, 5, COUNTER32, tcp_metric(TcpField::ActiveOpens)),
        Definition::scalar(&tcp, 6, COUNTER32, tcp_metric(TcpField::PassiveOpens)),
        Definition::scalar(&tcp, 7, COUNTER32, tcp_metric(TcpField::AttemptFails)),
        Definition::scalar(&tcp, 8, COUNTER32, tcp_metric(TcpField::EstabResets)),
        Definition::scalar(&tcp, 9, GAUGE32, tcp_metric(TcpField::CurrEstab)),
        Definition::scalar(&tcp, 10, COUNTER32, tcp_metric(TcpField::InSegs)),
        Definition::scalar(&tcp, 11, COUNTER32, tcp_metric(TcpField::OutSegs)),
        Definition::scalar(&tcp, 12, COUNTER32, tcp_metric(TcpField::RetransSegs)),
        Definition::scalar(&tcp, 14, COUNTER32, tcp_metric(TcpField::InErrs)),
        Definition::scalar(&tcp, 15, COUNTER32, tcp_metric(TcpField::OutRsts)),
        // udp
        Definition::scalar(&udp, 1, COUNTER32, udp_metric(UdpField::InDatagrams)),
        Definition::scalar(&udp, 2, COUNTER32, udp_metric(UdpField::NoPorts)),
        Definition::scalar(&udp, 3, COUNTER32, udp_metric(UdpField::InErrors)),
        Definition::scalar(&udp, 4, COUNTER32, udp_metric(UdpField::OutDatagrams)),
        // host resources
        Definition::scalar(&hr_system, 1, TIMETICKS, Cell::Metric(Metric::SystemUptime)),
        // UCD-SNMP memory
        Definition::scalar(&ucd_memory, 5, INTEGER, memory(MemoryField::Total)),
        Definition::scalar(&ucd_memory, 6, INTEGER, memory(MemoryField::Free)),
        Definition::scalar(&ucd_memory, 13, INTEGER, memory(MemoryField::Shared)),
        Definition::scalar(&ucd_memory, 14, INTEGER, memory(MemoryField::Buffers)),
        Definition::scalar(&ucd_memory, 15, INTEGER, memory(MemoryField::Cached)),
        // UCD-SNMP dskTable
        Definition::table(&dsk_entry, 1, INTEGER, rows(config.disks.len())),
        Definition::table(
            &dsk_entry,
            2,
            OCTET_STRING,
            config.disks.iter().map(|path| fixed(path.as_str())).collect(),
        ),
        Definition::table(&dsk_entry, 6, INTEGER, disk_metric(DiskField::Total)),
        Definition::table(&dsk_entry, 7, INTEGER, disk_metric(DiskField::Avail)),
        Definition::table(&dsk_entry, 8, INTEGER, disk_metric(DiskField::Used)),
        Definition::table(&dsk_entry, 9, INTEGER, disk_metric(DiskField::Percent)),
        Definition::table(&dsk_entry, 10, INTEGER, disk_metric(DiskField::PercentNode)),
        // UCD-SNMP laTable
        Definition::table(&la_entry, 1, INTEGER, rows(3)),
        Definition::table(
            &la_entry,
            2,
            OCTET_STRING,
            ["Load-1", "Load-5", "Load-15"].into_iter().map(fixed).collect(),
        ),
        Definition::table(&la_entry, 3, OCTET_STRING, loads(LoadField::Text)),
        Definition::table(&la_entry, 5, INTEGER, loads(LoadField::Integer)),
        // UCD-SNMP systemStats
        Definition::scalar(&system_stats, 50, COUNTER32, cpu_metric(CpuField::User)),
        Definition::scalar(&system_stats, 51, COUNTER32, cpu_metric(CpuField::Nice)),
        Definition::scalar(&system_stats, 52, COUNTER32, cpu_metric(CpuField::System)),
        Definition::scalar(&system_stats, 53, COUNTER32, cpu_metric(CpuField::Idle)),
        Definition::scalar(&system_stats, 59, COUNTER32, cpu_metric(CpuField::Interrupts)),
        Definition::scalar(&system_stats, 60, COUNTER32, cpu_metric(CpuField::Contexts)),
    ]
}
