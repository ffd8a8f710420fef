//! Host statistics feeding the MIB.
//!
//! [`HostInfo`] is sampled once per request (and once per refresh tick); the
//! MIB re-encodes its dynamic cells from the resulting [`HostSnapshot`].

use std::io;
use std::path::Path;
use std::time::Instant;

/// Counters and attributes of one network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    pub name: String,
    /// IANA ifType: ethernetCsmacd(6), ppp(23), softwareLoopback(24).
    pub if_type: i32,
    pub mtu: i32,
    /// Bits per second.
    pub speed: u32,
    pub phys_address: [u8; 6],
    /// up(1) or down(2).
    pub admin_status: i32,
    /// up(1), down(2), dormant(5), notPresent(6), lowerLayerDown(7).
    pub oper_status: i32,
    pub rx_bytes: u32,
    pub rx_packets: u32,
    pub rx_drops: u32,
    pub rx_errors: u32,
    pub tx_bytes: u32,
    pub tx_packets: u32,
    pub tx_drops: u32,
    pub tx_errors: u32,
}

/// Usage of one mounted filesystem, in kilobytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskStats {
    pub path: String,
    pub total: u32,
    pub avail: u32,
    pub used: u32,
    /// Percentage of blocks used, rounded up.
    pub percent: i32,
    /// Percentage of inodes used, rounded up.
    pub inode_percent: i32,
}

/// Memory figures from `/proc/meminfo`, in kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub total: u32,
    pub free: u32,
    pub shared: u32,
    pub buffers: u32,
    pub cached: u32,
}

/// CPU time and event counters from `/proc/stat`.
///
/// Times are in kernel ticks (`USER_HZ`) and wrap like Counter32.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStats {
    pub user: u32,
    pub nice: u32,
    pub system: u32,
    pub idle: u32,
    pub interrupts: u32,
    pub contexts: u32,
}

/// IP scalars from `/proc/net/snmp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpStats {
    /// forwarding(1) or notForwarding(2).
    pub forwarding: i32,
    pub default_ttl: i32,
    pub reasm_timeout: i32,
}

/// TCP group from `/proc/net/snmp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpStats {
    pub rto_algorithm: i32,
    pub rto_min: i32,
    pub rto_max: i32,
    /// -1 when the limit is dynamic.
    pub max_conn: i32,
    pub active_opens: u32,
    pub passive_opens: u32,
    pub attempt_fails: u32,
    pub estab_resets: u32,
    pub curr_estab: u32,
    pub in_segs: u32,
    pub out_segs: u32,
    pub retrans_segs: u32,
    pub in_errs: u32,
    pub out_rsts: u32,
}

/// UDP group from `/proc/net/snmp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UdpStats {
    pub in_datagrams: u32,
    pub no_ports: u32,
    pub in_errors: u32,
    pub out_datagrams: u32,
}

/// Everything the MIB exports about the host at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSnapshot {
    /// Time since the agent started, in hundredths of a second.
    pub agent_uptime: u32,
    /// Time since the host booted, in hundredths of a second.
    pub system_uptime: u32,
    /// 1, 5 and 15 minute load averages, in hundredths.
    pub load: [u32; 3],
    pub memory: MemoryStats,
    pub cpu: CpuStats,
    pub ip: IpStats,
    pub tcp: TcpStats,
    pub udp: UdpStats,
    /// One entry per requested interface, in request order.
    pub interfaces: Vec<InterfaceStats>,
    /// One entry per requested disk, in request order.
    pub disks: Vec<DiskStats>,
    pub hostname: String,
}

/// Source of host statistics.
///
/// `Send` so a [`Server`](crate::server::Server) can be moved onto a task.
pub trait HostInfo: Send {
    /// Sample the host. Unavailable figures are reported as zero.
    fn snapshot(&self, interfaces: &[String], disks: &[String]) -> HostSnapshot;
}

/// Reads statistics from Linux `/proc` and `/sys`, and filesystem usage
/// through `statvfs(3)`.
#[derive(Debug, Clone)]
pub struct ProcHost {
    started: Instant,
}

impl ProcHost {
    /// Agent uptime counts from the moment this is created.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for ProcHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostInfo for ProcHost {
    fn snapshot(&self, interfaces: &[String], disks: &[String]) -> HostSnapshot {
        let root = Path::new("/");
        let net_dev = read(&root.join("proc/net/dev"));
        let net_snmp = read(&root.join("proc/net/snmp")).unwrap_or_default();
        HostSnapshot {
            agent_uptime: centiseconds(self.started.elapsed().as_secs_f64()),
            system_uptime: read(&root.join("proc/uptime"))
                .as_deref()
                .map(parse_uptime)
                .unwrap_or_default(),
            load: read(&root.join("proc/loadavg"))
                .as_deref()
                .map(parse_loadavg)
                .unwrap_or_default(),
            memory: read(&root.join("proc/meminfo"))
                .as_deref()
                .map(parse_meminfo)
                .unwrap_or_default(),
            cpu: read(&root.join("proc/stat"))
                .as_deref()
                .map(parse_stat)
                .unwrap_or_default(),
            ip: parse_ip(&net_snmp),
            tcp: parse_tcp(&net_snmp),
            udp: parse_udp(&net_snmp),
            interfaces: interfaces
                .iter()
                .map(|name| interface_stats(root, name, net_dev.as_deref().unwrap_or("")))
                .collect(),
            disks: disks.iter().map(|path| disk_usage(path)).collect(),
            hostname: read(&root.join("proc/sys/kernel/hostname"))
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Returns the same figures on every call.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    pub snapshot: HostSnapshot,
}

impl StaticHost {
    pub fn new(snapshot: HostSnapshot) -> Self {
        Self { snapshot }
    }
}

impl HostInfo for StaticHost {
    fn snapshot(&self, interfaces: &[String], disks: &[String]) -> HostSnapshot {
        let mut snapshot = self.snapshot.clone();
        // Keep rows aligned with the configured names
        snapshot.interfaces = interfaces
            .iter()
            .map(|name| {
                self.snapshot
                    .interfaces
                    .iter()
                    .find(|i| &i.name == name)
                    .cloned()
                    .unwrap_or_else(|| InterfaceStats {
                        name: name.clone(),
                        ..Default::default()
                    })
            })
            .collect();
        snapshot.disks = disks
            .iter()
            .map(|path| {
                self.snapshot
                    .disks
                    .iter()
                    .find(|d| &d.path == path)
                    .cloned()
                    .unwrap_or_else(|| DiskStats {
                        path: path.clone(),
                        ..Default::default()
                    })
            })
            .collect();
        snapshot
    }
}

fn read(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(error) => {
            tracing::trace!(target: "snmpbug::host", { path = %path.display(), %error }, "host source unavailable");
            None
        }
    }
}

fn centiseconds(seconds: f64) -> u32 {
    (seconds * 100.0) as u32
}

fn parse_uptime(content: &str) -> u32 {
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .map(centiseconds)
        .unwrap_or(0)
}

fn parse_loadavg(content: &str) -> [u32; 3] {
    let mut load = [0u32; 3];
    for (slot, field) in load.iter_mut().zip(content.split_whitespace()) {
        *slot = field.parse::<f64>().map(|v| (v * 100.0) as u32).unwrap_or(0);
    }
    load
}

fn parse_meminfo(content: &str) -> MemoryStats {
    let mut memory = MemoryStats::default();
    let mut shmem = None;
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            .min(u32::MAX as u64) as u32;
        match key {
            "MemTotal" => memory.total = value,
            "MemFree" => memory.free = value,
            "MemShared" => memory.shared = value,
            "Shmem" => shmem = Some(value),
            "Buffers" => memory.buffers = value,
            "Cached" => memory.cached = value,
            _ => {}
        }
    }
    // Kernels since 2.6 report shared memory as Shmem
    if memory.shared == 0 {
        memory.shared = shmem.unwrap_or(0);
    }
    memory
}

/// `/proc/stat`: aggregate CPU times, then the interrupt and context
/// switch totals.
fn parse_stat(content: &str) -> CpuStats {
    let mut cpu = CpuStats::default();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let key = fields.next();
        let mut next = || -> u32 {
            fields
                .next()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0) as u32
        };
        match key {
            Some("cpu") => {
                cpu.user = next();
                cpu.nice = next();
                cpu.system = next();
                cpu.idle = next();
            }
            Some("intr") => cpu.interrupts = next(),
            Some("ctxt") => cpu.contexts = next(),
            _ => {}
        }
    }
    cpu
}

/// One protocol's counters from `/proc/net/snmp`, keyed by column name.
///
/// Each protocol has a header line naming the columns followed by a line of
/// values, both starting with `Proto:`.
fn net_snmp_row<'a>(content: &'a str, protocol: &str) -> Vec<(&'a str, i64)> {
    let mut lines = content
        .lines()
        .filter_map(|line| line.strip_prefix(protocol)?.strip_prefix(':'));
    let (Some(header), Some(values)) = (lines.next(), lines.next()) else {
        return Vec::new();
    };
    header
        .split_whitespace()
        .zip(values.split_whitespace().map(|v| v.parse().unwrap_or(0)))
        .collect()
}

fn column(row: &[(&str, i64)], name: &str) -> i64 {
    row.iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
        .unwrap_or(0)
}

fn parse_ip(content: &str) -> IpStats {
    let row = net_snmp_row(content, "Ip");
    let int = |name| column(&row, name) as i32;
    IpStats {
        forwarding: int("Forwarding"),
        default_ttl: int("DefaultTTL"),
        reasm_timeout: int("ReasmTimeout"),
    }
}

fn parse_tcp(content: &str) -> TcpStats {
    let row = net_snmp_row(content, "Tcp");
    let int = |name| column(&row, name) as i32;
    // Counter32 wraps
    let counter = |name| column(&row, name) as u32;
    TcpStats {
        rto_algorithm: int("RtoAlgorithm"),
        rto_min: int("RtoMin"),
        rto_max: int("RtoMax"),
        max_conn: int("MaxConn"),
        active_opens: counter("ActiveOpens"),
        passive_opens: counter("PassiveOpens"),
        attempt_fails: counter("AttemptFails"),
        estab_resets: counter("EstabResets"),
        curr_estab: column(&row, "CurrEstab").clamp(0, u32::MAX as i64) as u32,
        in_segs: counter("InSegs"),
        out_segs: counter("OutSegs"),
        retrans_segs: counter("RetransSegs"),
        in_errs: counter("InErrs"),
        out_rsts: counter("OutRsts"),
    }
}

fn parse_udp(content: &str) -> UdpStats {
    let row = net_snmp_row(content, "Udp");
    let counter = |name| column(&row, name) as u32;
    UdpStats {
        in_datagrams: counter("InDatagrams"),
        no_ports: counter("NoPorts"),
        in_errors: counter("InErrors"),
        out_datagrams: counter("OutDatagrams"),
    }
}

/// Block and inode counts of one filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FsUsage {
    fragment_size: u64,
    blocks: u64,
    blocks_free: u64,
    files: u64,
    files_free: u64,
}

#[cfg(unix)]
fn statvfs(path: &str) -> io::Result<FsUsage> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let c_path = CString::new(path).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is NUL-terminated and stat is only read on success
    let result = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    let stat = unsafe { stat.assume_init() };
    Ok(FsUsage {
        fragment_size: stat.f_frsize as u64,
        blocks: stat.f_blocks as u64,
        blocks_free: stat.f_bfree as u64,
        files: stat.f_files as u64,
        files_free: stat.f_ffree as u64,
    })
}

#[cfg(not(unix))]
fn statvfs(_path: &str) -> io::Result<FsUsage> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Share of `total` that is `used`, in percent rounded up.
fn percent_used(used: u64, total: u64) -> i32 {
    if total == 0 {
        return 0;
    }
    (used.saturating_mul(100).saturating_add(total - 1) / total).min(100) as i32
}

fn disk_stats(path: &str, usage: &FsUsage) -> DiskStats {
    let kb = |blocks: u64| {
        (blocks.saturating_mul(usage.fragment_size) / 1024).min(u32::MAX as u64) as u32
    };
    let used_blocks = usage.blocks.saturating_sub(usage.blocks_free);
    DiskStats {
        path: path.to_string(),
        total: kb(usage.blocks),
        avail: kb(usage.blocks_free),
        used: kb(used_blocks),
        percent: percent_used(used_blocks, usage.blocks),
        inode_percent: percent_used(usage.files.saturating_sub(usage.files_free), usage.files),
    }
}

/// Unreadable filesystems report zero usage.
fn disk_usage(path: &str) -> DiskStats {
    match statvfs(path) {
        Ok(usage) => disk_stats(path, &usage),
        Err(error) => {
            tracing::trace!(target: "snmpbug::host", { path, %error }, "filesystem unavailable");
            DiskStats {
                path: path.to_string(),
                ..Default::default()
            }
        }
    }
}

/// Counters for `name` from `/proc/net/dev`.
///
/// Receive columns: bytes packets errs drop fifo frame compressed multicast,
/// then the same for transmit.
fn parse_net_dev(content: &str, name: &str) -> Option<[u64; 16]> {
    content.lines().find_map(|line| {
        let (iface, counters) = line.split_once(':')?;
        if iface.trim() != name {
            return None;
        }
        let mut values = [0u64; 16];
        for (slot, field) in values.iter_mut().zip(counters.split_whitespace()) {
            *slot = field.parse().unwrap_or(0);
        }
        Some(values)
    })
}

fn parse_mac(content: &str) -> [u8; 6] {
    let mut mac = [0u8; 6];
    for (slot, part) in mac.iter_mut().zip(content.trim().split(':')) {
        *slot = u8::from_str_radix(part, 16).unwrap_or(0);
    }
    mac
}

fn oper_status(state: &str) -> i32 {
    match state.trim() {
        // loopback and some virtual devices never report "up"
        "up" | "unknown" => 1,
        "down" => 2,
        "dormant" => 5,
        "notpresent" => 6,
        "lowerlayerdown" => 7,
        _ => 2,
    }
}

fn if_type(arphrd: i32) -> i32 {
    match arphrd {
        772 => 24, // ARPHRD_LOOPBACK
        512 => 23, // ARPHRD_PPP
        _ => 6,
    }
}

fn interface_stats(root: &Path, name: &str, net_dev: &str) -> InterfaceStats {
    let sys = root.join("sys/class/net").join(name);
    let number = |file: &str| -> Option<i64> { read(&sys.join(file))?.trim().parse().ok() };
    let flags = read(&sys.join("flags"))
        .and_then(|s| i64::from_str_radix(s.trim().trim_start_matches("0x"), 16).ok())
        .unwrap_or(0);
    let counters = parse_net_dev(net_dev, name).unwrap_or_default();
    // Counter32 wraps
    let counter = |i: usize| counters[i] as u32;

    InterfaceStats {
        name: name.to_string(),
        if_type: if_type(number("type").unwrap_or(1) as i32),
        mtu: number("mtu").unwrap_or(1500) as i32,
        speed: number("speed")
            .filter(|mbps| *mbps > 0)
            .unwrap_or(1000)
            .saturating_mul(1_000_000)
            .min(u32::MAX as i64) as u32,
        phys_address: read(&sys.join("address"))
            .as_deref()
            .map(parse_mac)
            .unwrap_or_default(),
        admin_status: if flags & 0x1 != 0 { 1 } else { 2 },
        oper_status: read(&sys.join("operstate"))
            .as_deref()
            .map(oper_status)
            .unwrap_or(2),
        rx_bytes: counter(0),
        rx_packets: counter(1),
        rx_errors: counter(2),
        rx_drops: counter(3),
        tx_bytes: counter(8),
        tx_packets: counter(9),
        tx_errors: counter(10),
        tx_drops: counter(11),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uptime_and_load() {
        assert_eq!(parse_uptime("12345.67 54321.00\n"), 1234567);
        assert_eq!(parse_uptime(""), 0);
        assert_eq!(parse_loadavg("0.52 1.05 2.00 1/234 5678\n"), [52, 105, 200]);
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16314500 kB\n\
                       MemFree:         1234567 kB\n\
                       Buffers:          204800 kB\n\
                       Cached:          4096000 kB\n\
                       Shmem:             65536 kB\n";
        let memory = parse_meminfo(content);
        assert_eq!(memory.total, 16314500);
        assert_eq!(memory.free, 1234567);
        assert_eq!(memory.shared, 65536);
        assert_eq!(memory.buffers, 204800);
        assert_eq!(memory.cached, 4096000);
    }

    #[test]
    fn test_parse_net_dev() {
        let content = "Inter-|   Receive                                                |  Transmit\n \
                        face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n    \
                        lo: 1000 10 0 0 0 0 0 0 1000 10 0 0 0 0 0 0\n  \
                        eth0: 5000 50 1 2 0 0 0 3 7000 70 4 5 0 0 0 0\n";
        let counters = parse_net_dev(content, "eth0").unwrap();
        assert_eq!(counters[0], 5000);
        assert_eq!(counters[3], 2);
        assert_eq!(counters[8], 7000);
        assert_eq!(counters[11], 5);
        assert!(parse_net_dev(content, "eth1").is_none());
    }

    #[test]
    fn test_parse_mac_and_status() {
        assert_eq!(parse_mac("52:54:00:ab:cd:ef\n"), [0x52, 0x54, 0x00, 0xab, 0xcd, 0xef]);
        assert_eq!(oper_status("up\n"), 1);
        assert_eq!(oper_status("lowerlayerdown"), 7);
        assert_eq!(if_type(772), 24);
        assert_eq!(if_type(1), 6);
    }

    #[test]
    fn test_parse_stat() {
        let content = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 0 0\n\
                       cpu0 1393280 32966 572056 13343292 6130 0 17875 0 0 0\n\
                       intr 199292853 30 0 0 0\n\
                       ctxt 4218402393\n\
                       btime 1700000000\n";
        let cpu = parse_stat(content);
        assert_eq!(cpu.user, 10132153);
        assert_eq!(cpu.nice, 290696);
        assert_eq!(cpu.system, 3084719);
        assert_eq!(cpu.idle, 46828483);
        assert_eq!(cpu.interrupts, 199292853);
        assert_eq!(cpu.contexts, 4218402393);
        assert_eq!(parse_stat(""), CpuStats::default());
    }

    const NET_SNMP: &str = "\
Ip: Forwarding DefaultTTL InReceives InHdrErrors InAddrErrors ForwDatagrams InUnknownProtos InDiscards InDelivers OutRequests OutDiscards OutNoRoutes ReasmTimeout ReasmReqds
Ip: 2 64 1000 0 0 0 0 0 990 800 0 0 30 0
Icmp: InMsgs InErrors
Icmp: 5 0
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens PassiveOpens AttemptFails EstabResets CurrEstab InSegs OutSegs RetransSegs InErrs OutRsts InCsumErrors
Tcp: 1 200 120000 -1 11 22 3 4 5 6000 7000 80 9 10 0
Udp: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors IgnoredMulti
Udp: 100 2 1 90 0 0 0 0
UdpLite: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors IgnoredMulti
UdpLite: 7 7 7 7 0 0 0 0
";

    #[test]
    fn test_parse_net_snmp() {
        let ip = parse_ip(NET_SNMP);
        assert_eq!(ip.forwarding, 2);
        assert_eq!(ip.default_ttl, 64);
        assert_eq!(ip.reasm_timeout, 30);

        let tcp = parse_tcp(NET_SNMP);
        assert_eq!(tcp.rto_algorithm, 1);
        assert_eq!(tcp.rto_max, 120000);
        assert_eq!(tcp.max_conn, -1);
        assert_eq!(tcp.passive_opens, 22);
        assert_eq!(tcp.curr_estab, 5);
        assert_eq!(tcp.out_rsts, 10);

        let udp = parse_udp(NET_SNMP);
        assert_eq!(udp.in_datagrams, 100);
        assert_eq!(udp.no_ports, 2);
        assert_eq!(udp.out_datagrams, 90);

        assert_eq!(parse_tcp(""), TcpStats::default());
    }

    #[test]
    fn test_disk_stats() {
        let usage = FsUsage {
            fragment_size: 4096,
            blocks: 1000,
            blocks_free: 250,
            files: 300,
            files_free: 200,
        };
        let disk = disk_stats("/var", &usage);
        assert_eq!(disk.path, "/var");
        assert_eq!(disk.total, 4000);
        assert_eq!(disk.avail, 1000);
        assert_eq!(disk.used, 3000);
        assert_eq!(disk.percent, 75);
        // 100 of 300 inodes is 33.3%, rounded up
        assert_eq!(disk.inode_percent, 34);

        let empty = disk_stats("/proc", &FsUsage::default());
        assert_eq!(empty.total, 0);
        assert_eq!(empty.percent, 0);
        assert_eq!(empty.inode_percent, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_statvfs() {
        let root = statvfs("/").unwrap();
        assert!(root.fragment_size > 0);
        assert!(root.blocks_free <= root.blocks);

        let missing = statvfs("/does/not/exist").unwrap_err();
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
        assert_eq!(disk_usage("/does/not/exist").total, 0);
    }

    #[test]
    fn test_static_host_aligns_rows() {
        let host = StaticHost::new(HostSnapshot {
            interfaces: vec![InterfaceStats {
                name: "eth0".into(),
                mtu: 9000,
                ..Default::default()
            }],
            ..Default::default()
        });
        let snapshot = host.snapshot(&["lo".into(), "eth0".into()], &["/".into()]);
        assert_eq!(snapshot.interfaces.len(), 2);
        assert_eq!(snapshot.interfaces[0].name, "lo");
        assert_eq!(snapshot.interfaces[1].mtu, 9000);
        assert_eq!(snapshot.disks[0].path, "/");
    }

    #[test]
    fn test_proc_host_rows_follow_request() {
        let host = ProcHost::new();
        let snapshot = host.snapshot(&["does-not-exist0".into()], &["/".into(), "/tmp".into()]);
        assert_eq!(snapshot.interfaces.len(), 1);
        assert_eq!(snapshot.interfaces[0].rx_bytes, 0);
        assert_eq!(snapshot.disks.len(), 2);
    }
}
