//! Request processing.
//!
//! [`Engine::process`] turns one request datagram (or one reassembled TCP
//! message) into at most one response. MIB values are spliced into the
//! response as the TLVs the store already holds.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::ber::{EncodeBuf, length_size};
use crate::config::{AgentConfig, MAX_PACKET_SIZE, MAX_VALUES};
use crate::error::{EncodeErrorKind, Error, ErrorStatus, Result};
use crate::host::{HostInfo, HostSnapshot};
use crate::message::CommunityMessage;
use crate::mib::MibStore;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::util::display_addr;
use crate::value::Value;
use crate::version::Version;

/// One response varbind with its value already encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub oid: Oid,
    /// Complete value TLV.
    pub value: Bytes,
}

impl Binding {
    fn marker(oid: Oid, value: Value) -> Result<Self> {
        Ok(Self {
            oid,
            value: value.to_tlv()?,
        })
    }

    /// Octets this binding occupies inside the varbind list.
    pub fn encoded_len(&self) -> usize {
        let oid_len = self.oid.encoded_length();
        let content = 1 + length_size(oid_len) + oid_len + self.value.len();
        1 + length_size(content) + content
    }

    fn encode(&self, buf: &mut EncodeBuf) -> Result<()> {
        buf.push_sequence(|buf| {
            buf.push_encoded(&self.value)?;
            buf.push_oid(&self.oid)
        })
    }
}

/// A response PDU under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub request_id: i32,
    pub error_status: ErrorStatus,
    pub error_index: i32,
    pub bindings: Vec<Binding>,
}

impl Response {
    fn ok(request_id: i32, bindings: Vec<Binding>) -> Self {
        Self {
            request_id,
            error_status: ErrorStatus::NoError,
            error_index: 0,
            bindings,
        }
    }

    /// Error response echoing the request OIDs with NULL values.
    fn error(pdu: &Pdu, status: ErrorStatus, index: usize) -> Result<Self> {
        let null = Value::Null.to_tlv()?;
        Ok(Self {
            request_id: pdu.request_id,
            error_status: status,
            error_index: index as i32,
            bindings: pdu
                .varbinds
                .iter()
                .map(|vb| Binding {
                    oid: vb.oid.clone(),
                    value: null.clone(),
                })
                .collect(),
        })
    }

    /// Encode as a complete message answering `request`.
    pub fn encode(&self, request: &CommunityMessage, limit: usize) -> Result<Bytes> {
        self.encode_prefix(request, self.bindings.len(), limit)
    }

    fn encode_prefix(
        &self,
        request: &CommunityMessage,
        count: usize,
        limit: usize,
    ) -> Result<Bytes> {
        let mut buf = EncodeBuf::with_limit(limit);
        buf.push_sequence(|buf| {
            buf.push_constructed(PduType::Response.tag(), |buf| {
                buf.push_sequence(|buf| {
                    for binding in self.bindings[..count].iter().rev() {
                        binding.encode(buf)?;
                    }
                    Ok(())
                })?;
                buf.push_integer(self.error_index)?;
                buf.push_integer(self.error_status.as_i32())?;
                buf.push_integer(self.request_id)
            })?;
            buf.push_octet_string(&request.community)?;
            buf.push_integer(request.version.as_i32())
        })?;
        Ok(buf.finish())
    }

    /// Encode as many leading bindings as fit in `limit` octets.
    fn encode_truncated(&self, request: &CommunityMessage, limit: usize) -> Result<Bytes> {
        let envelope = self.encode_prefix(request, 0, limit)?.len();
        // Each of the three enclosing length fields can grow by two octets
        let budget = limit.saturating_sub(envelope + 6);
        let mut used = 0;
        let mut count = self
            .bindings
            .iter()
            .take_while(|b| {
                used += b.encoded_len();
                used <= budget
            })
            .count();

        loop {
            match self.encode_prefix(request, count, limit) {
                Err(Error::Encode {
                    kind: EncodeErrorKind::BufferFull { .. },
                }) if count > 0 => count -= 1,
                result => {
                    if count < self.bindings.len() {
                        tracing::debug!(target: "snmpbug::engine", { kept = count, dropped = self.bindings.len() - count }, "response trimmed to fit");
                    }
                    return result;
                }
            }
        }
    }
}

/// Looks up and refreshes MIB entries for one request.
///
/// The host is sampled at most once, the first time a dynamic entry is
/// answered with.
struct Resolver<'a> {
    mib: &'a mut MibStore,
    host: &'a dyn HostInfo,
    config: &'a AgentConfig,
    snapshot: Option<HostSnapshot>,
}

impl<'a> Resolver<'a> {
    fn new(mib: &'a mut MibStore, host: &'a dyn HostInfo, config: &'a AgentConfig) -> Self {
        Self {
            mib,
            host,
            config,
            snapshot: None,
        }
    }

    /// Current value of the entry at `idx`.
    fn binding(&mut self, idx: usize) -> Result<Option<Binding>> {
        let dynamic = self
            .mib
            .get(idx)
            .is_some_and(|(_, entry)| entry.metric.is_some());
        if dynamic {
            let (host, config) = (self.host, self.config);
            let snapshot = self
                .snapshot
                .get_or_insert_with(|| host.snapshot(&config.interfaces, &config.disks));
            self.mib.refresh(idx, snapshot)?;
        }
        Ok(self.mib.get(idx).map(|(oid, entry)| Binding {
            oid: oid.clone(),
            value: entry.encoded.clone(),
        }))
    }

    /// GET lookup: the exact entry, or the only entry beneath `oid`.
    fn exact(&mut self, oid: &Oid) -> Result<Option<Binding>> {
        let mut cursor = 0;
        let Some(idx) = self.mib.find_exact_or_child(oid, &mut cursor) else {
            return Ok(None);
        };
        if self.mib.oid(idx) != Some(oid) {
            let mut next = cursor + 1;
            if self.mib.find_exact_or_child(oid, &mut next).is_some() {
                tracing::debug!(target: "snmpbug::engine", { snmp.oid = %oid }, "GET on a node with several children");
                return Ok(None);
            }
        }
        self.binding(idx)
    }

    /// GETNEXT lookup: the first entry after `oid`.
    fn next(&mut self, oid: &Oid) -> Result<Option<Binding>> {
        match self.mib.find_next(oid) {
            Some(idx) => self.binding(idx),
            None => Ok(None),
        }
    }
}

/// Answers requests against a [`MibStore`].
#[derive(Debug, Clone)]
pub struct Engine {
    config: AgentConfig,
}

impl Engine {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Process one request from `peer`.
    ///
    /// Returns the encoded response, or `None` when the request is answered
    /// with silence. Errors mean the request was malformed, used the wrong
    /// community, or produced a response too large to send.
    pub fn process(
        &self,
        mib: &mut MibStore,
        host: &dyn HostInfo,
        packet: Bytes,
        peer: SocketAddr,
    ) -> Result<Option<Bytes>> {
        let request = CommunityMessage::decode(packet)?;
        self.check_community(&request, peer)?;

        let pdu = &request.pdu;
        tracing::debug!(target: "snmpbug::engine", {
            snmp.source = %display_addr(peer),
            snmp.version = %request.version,
            snmp.pdu_type = %pdu.pdu_type,
            snmp.request_id = pdu.request_id,
            snmp.varbind_count = pdu.varbinds.len(),
        }, "request");

        let mut resolver = Resolver::new(mib, host, &self.config);
        let response = match (pdu.pdu_type, request.version) {
            (PduType::GetRequest, version) => get(&mut resolver, pdu, version)?,
            (PduType::GetNextRequest, version) => get_next(&mut resolver, pdu, version)?,
            (PduType::GetBulkRequest, Version::V2c) => {
                let response = get_bulk(&mut resolver, pdu)?;
                return response.encode_truncated(&request, MAX_PACKET_SIZE).map(Some);
            }
            (PduType::SetRequest, version) => {
                let status = match version {
                    Version::V1 => ErrorStatus::NoSuchName,
                    Version::V2c => ErrorStatus::NotWritable,
                };
                let index = usize::from(!pdu.varbinds.is_empty());
                Response::error(pdu, status, index)?
            }
            (pdu_type, version) => {
                tracing::debug!(target: "snmpbug::engine", { snmp.pdu_type = %pdu_type, snmp.version = %version }, "ignoring PDU");
                return Ok(None);
            }
        };

        response.encode(&request, MAX_PACKET_SIZE).map(Some)
    }

    fn check_community(&self, request: &CommunityMessage, peer: SocketAddr) -> Result<()> {
        let community = String::from_utf8_lossy(&request.community);
        let source = display_addr(peer);
        if let Some(expected) = &self.config.community
            && expected.as_bytes() != &request.community[..]
        {
            tracing::warn!(target: "snmpbug::engine", { snmp.source = %source, snmp.community = %community }, "invalid community");
            return Err(Error::InvalidCommunity { target: Some(peer) });
        }
        tracing::info!(target: "snmpbug::engine", { snmp.source = %source, snmp.community = %community }, "host {} used community '{}'", source.ip(), community);
        Ok(())
    }
}

fn get(resolver: &mut Resolver<'_>, pdu: &Pdu, version: Version) -> Result<Response> {
    let mut bindings = Vec::with_capacity(pdu.varbinds.len());
    for (i, vb) in pdu.varbinds.iter().enumerate() {
        match resolver.exact(&vb.oid)? {
            Some(binding) => bindings.push(binding),
            None if version == Version::V1 => {
                return Response::error(pdu, ErrorStatus::NoSuchName, i + 1);
            }
            None => bindings.push(Binding::marker(vb.oid.clone(), Value::NoSuchObject)?),
        }
    }
    Ok(Response::ok(pdu.request_id, bindings))
}

fn get_next(resolver: &mut Resolver<'_>, pdu: &Pdu, version: Version) -> Result<Response> {
    let mut bindings = Vec::with_capacity(pdu.varbinds.len());
    for (i, vb) in pdu.varbinds.iter().enumerate() {
        match resolver.next(&vb.oid)? {
            Some(binding) => bindings.push(binding),
            None if version == Version::V1 => {
                return Response::error(pdu, ErrorStatus::NoSuchName, i + 1);
            }
            None => bindings.push(Binding::marker(vb.oid.clone(), Value::EndOfMibView)?),
        }
    }
    Ok(Response::ok(pdu.request_id, bindings))
}

/// GETBULK (RFC 3416 4.2.3): non-repeaters once, then repeaters interleaved
/// row by row. Exhausted repeaters keep reporting endOfMibView.
fn get_bulk(resolver: &mut Resolver<'_>, pdu: &Pdu) -> Result<Response> {
    let varbinds = &pdu.varbinds;
    let non_repeaters = (pdu.non_repeaters() as usize).min(varbinds.len());
    let max_repetitions = pdu.max_repetitions() as usize;
    let end = Value::EndOfMibView.to_tlv()?;
    let mut bindings = Vec::new();

    for vb in &varbinds[..non_repeaters] {
        if bindings.len() == MAX_VALUES {
            break;
        }
        step(resolver, &mut bindings, &vb.oid, &end)?;
    }

    // Last OID reached per repeater, and whether it ran off the end
    let mut cursors: Vec<(Oid, bool)> = varbinds[non_repeaters..]
        .iter()
        .map(|vb| (vb.oid.clone(), false))
        .collect();

    'rows: for _ in 0..max_repetitions {
        if cursors.is_empty() {
            break;
        }
        for (oid, exhausted) in cursors.iter_mut() {
            if bindings.len() == MAX_VALUES {
                break 'rows;
            }
            if *exhausted {
                bindings.push(Binding {
                    oid: oid.clone(),
                    value: end.clone(),
                });
                continue;
            }
            match step(resolver, &mut bindings, oid, &end)? {
                Some(found) => *oid = found,
                None => *exhausted = true,
            }
        }
    }

    Ok(Response::ok(pdu.request_id, bindings))
}

/// Append the successor of `oid`, or endOfMibView. Returns the OID reached.
fn step(
    resolver: &mut Resolver<'_>,
    bindings: &mut Vec<Binding>,
    oid: &Oid,
    end: &Bytes,
) -> Result<Option<Oid>> {
    match resolver.next(oid)? {
        Some(binding) => {
            let reached = binding.oid.clone();
            bindings.push(binding);
            Ok(Some(reached))
        }
        None => {
            bindings.push(Binding {
                oid: oid.clone(),
                value: end.clone(),
            });
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;
    use crate::mib::standard_definitions;
    use crate::oid;
    use crate::varbind::VarBind;

    fn peer() -> SocketAddr {
        "192.0.2.7:40000".parse().unwrap()
    }

    fn setup(community: Option<&str>) -> (Engine, MibStore, StaticHost) {
        let config = AgentConfig {
            description: "test".into(),
            community: community.map(String::from),
            interfaces: vec!["eth0".into()],
            ..Default::default()
        };
        let host = StaticHost::new(HostSnapshot {
            agent_uptime: 100,
            hostname: "testhost".into(),
            ..Default::default()
        });
        let snapshot = host.snapshot(&config.interfaces, &config.disks);
        let mib = MibStore::build(&standard_definitions(&config, &snapshot), &snapshot).unwrap();
        (Engine::new(config), mib, host)
    }

    fn request(
        version: Version,
        pdu_type: PduType,
        oids: &[Oid],
        status: i32,
        index: i32,
    ) -> Bytes {
        CommunityMessage::new(
            version,
            Bytes::from_static(b"public"),
            Pdu {
                pdu_type,
                request_id: 77,
                error_status: status,
                error_index: index,
                varbinds: oids.iter().cloned().map(VarBind::null).collect(),
            },
        )
        .encode()
        .unwrap()
    }

    fn exchange(
        (engine, mib, host): &mut (Engine, MibStore, StaticHost),
        packet: Bytes,
    ) -> Option<CommunityMessage> {
        engine
            .process(mib, &*host, packet, peer())
            .unwrap()
            .map(|bytes| CommunityMessage::decode_with_limit(bytes, MAX_VALUES).unwrap())
    }

    #[test]
    fn test_get_sys_descr() {
        let mut agent = setup(None);
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetRequest, &[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)], 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.pdu_type, PduType::Response);
        assert_eq!(resp.pdu.request_id, 77);
        assert_eq!(&resp.community[..], b"public");
        assert_eq!(resp.pdu.varbinds.len(), 1);
        assert_eq!(resp.pdu.varbinds[0].value, Value::from("test"));
    }

    #[test]
    fn test_get_refreshes_dynamic_value() {
        let mut agent = setup(None);
        agent.2.snapshot.agent_uptime = 9999;
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetRequest, &[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)], 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.varbinds[0].value, Value::TimeTicks(9999));
    }

    #[test]
    fn test_get_prefix_resolves_single_child() {
        let mut agent = setup(None);
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetRequest, &[oid!(1, 3, 6, 1, 2, 1, 1, 5)], 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 5, 0));
        assert_eq!(resp.pdu.varbinds[0].value, Value::from("testhost"));
    }

    #[test]
    fn test_get_ambiguous_prefix_is_missing() {
        let mut agent = setup(None);
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetRequest, &[oid!(1, 3, 6, 1, 2, 1, 1)], 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1));
        assert_eq!(resp.pdu.varbinds[0].value, Value::NoSuchObject);
    }

    #[test]
    fn test_get_missing_v2c_and_v1() {
        let mut agent = setup(None);
        let oids = [oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), oid!(1, 3, 6, 1, 6, 3, 1)];

        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetRequest, &oids, 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.error_status(), ErrorStatus::NoError);
        assert_eq!(resp.pdu.varbinds[1].value, Value::NoSuchObject);

        let resp = exchange(
            &mut agent,
            request(Version::V1, PduType::GetRequest, &oids, 0, 0),
        )
        .unwrap();
        assert_eq!(resp.version, Version::V1);
        assert_eq!(resp.pdu.error_status(), ErrorStatus::NoSuchName);
        assert_eq!(resp.pdu.error_index, 2);
        assert_eq!(resp.pdu.varbinds.len(), 2);
        assert!(resp.pdu.varbinds.iter().all(|vb| vb.value == Value::Null));
        assert_eq!(resp.pdu.varbinds[0].oid, oids[0]);
    }

    #[test]
    fn test_get_next() {
        let mut agent = setup(None);
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetNextRequest, &[oid!(1, 3, 6, 1, 2, 1, 1)], 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
    }

    #[test]
    fn test_get_next_past_end() {
        let mut agent = setup(None);
        let oids = [oid!(1, 3, 6, 1, 6)];
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetNextRequest, &oids, 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.varbinds[0].value, Value::EndOfMibView);
        assert_eq!(resp.pdu.varbinds[0].oid, oids[0]);

        let resp = exchange(
            &mut agent,
            request(Version::V1, PduType::GetNextRequest, &oids, 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.error_status(), ErrorStatus::NoSuchName);
        assert_eq!(resp.pdu.error_index, 1);
    }

    #[test]
    fn test_get_bulk_interleaves() {
        let mut agent = setup(None);
        let oids = [
            oid!(1, 3, 6, 1, 2, 1, 1, 1),
            oid!(1, 3, 6, 1, 2, 1, 1),
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1),
        ];
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetBulkRequest, &oids, 1, 3),
        )
        .unwrap();
        let got: Vec<Oid> = resp.pdu.varbinds.iter().map(|vb| vb.oid.clone()).collect();
        assert_eq!(
            got,
            vec![
                oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 1),
                oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
                oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 1),
                oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
                oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3, 1),
            ]
        );
    }

    #[test]
    fn test_get_bulk_end_of_view_fills_slots() {
        let mut agent = setup(None);
        let last = agent.1.oid(agent.1.len() - 2).unwrap().clone();
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetBulkRequest, &[last], 0, 4),
        )
        .unwrap();
        let values: Vec<&Value> = resp.pdu.varbinds.iter().map(|vb| &vb.value).collect();
        assert_eq!(values.len(), 4);
        assert!(!values[0].is_exception());
        assert_eq!(values[1..], [&Value::EndOfMibView; 3]);
    }

    #[test]
    fn test_get_bulk_negative_fields_and_v1() {
        let mut agent = setup(None);
        let oids = [oid!(1, 3, 6, 1, 2, 1, 1)];
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::GetBulkRequest, &oids, -1, -5),
        )
        .unwrap();
        assert!(resp.pdu.varbinds.is_empty());

        let v1 = request(Version::V1, PduType::GetBulkRequest, &oids, 0, 5);
        assert!(exchange(&mut agent, v1).is_none());
    }

    #[test]
    fn test_get_bulk_trimmed_to_packet_size() {
        let mut agent = setup(None);
        let oids = [oid!(1, 3)];
        let packet = request(Version::V2c, PduType::GetBulkRequest, &oids, 0, 10_000);
        let bytes = agent.0.process(&mut agent.1, &agent.2, packet, peer()).unwrap().unwrap();
        assert!(bytes.len() <= MAX_PACKET_SIZE);
        let resp = CommunityMessage::decode_with_limit(bytes, MAX_VALUES).unwrap();
        assert!(!resp.pdu.varbinds.is_empty());
        assert_eq!(resp.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
    }

    #[test]
    fn test_set_rejected() {
        let mut agent = setup(None);
        let oids = [oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)];
        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::SetRequest, &oids, 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.error_status(), ErrorStatus::NotWritable);
        assert_eq!(resp.pdu.error_index, 1);
        assert_eq!(resp.pdu.varbinds, vec![VarBind::null(oids[0].clone())]);

        let resp = exchange(
            &mut agent,
            request(Version::V1, PduType::SetRequest, &oids, 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.error_status(), ErrorStatus::NoSuchName);

        let resp = exchange(
            &mut agent,
            request(Version::V2c, PduType::SetRequest, &[], 0, 0),
        )
        .unwrap();
        assert_eq!(resp.pdu.error_index, 0);
    }

    #[test]
    fn test_non_request_pdus_ignored() {
        let mut agent = setup(None);
        for pdu_type in [
            PduType::Response,
            PduType::TrapV2,
            PduType::InformRequest,
            PduType::Report,
        ] {
            let packet = request(Version::V2c, pdu_type, &[oid!(1, 3, 6, 1)], 0, 0);
            assert!(exchange(&mut agent, packet).is_none(), "{pdu_type}");
        }
    }

    #[test]
    fn test_community_check() {
        let (engine, mut mib, host) = setup(Some("secret"));
        let sys_descr = [oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)];
        let packet = request(Version::V2c, PduType::GetRequest, &sys_descr, 0, 0);
        assert!(matches!(
            engine.process(&mut mib, &host, packet, peer()),
            Err(Error::InvalidCommunity { target: Some(_) })
        ));

        let (engine, mut mib, host) = setup(Some("public"));
        let packet = request(Version::V2c, PduType::GetRequest, &sys_descr, 0, 0);
        assert!(engine.process(&mut mib, &host, packet, peer()).unwrap().is_some());
    }

    #[test]
    fn test_malformed_request_is_error() {
        let (engine, mut mib, host) = setup(None);
        let packet = Bytes::from_static(&[0x30, 0x03, 0x02, 0x01]);
        let result = engine.process(&mut mib, &host, packet, peer());
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_binding_encoded_len() {
        let binding =
            Binding::marker(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("test")).unwrap();
        let mut buf = EncodeBuf::new();
        binding.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), binding.encoded_len());
    }
}
