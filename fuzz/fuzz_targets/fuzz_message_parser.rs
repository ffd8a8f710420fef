#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use snmpbug::message::{CommunityMessage, frame_status};
use snmpbug::pdu::Pdu;

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    let _ = frame_status(data);
    let _ = CommunityMessage::decode(bytes.clone());

    let mut decoder = snmpbug::ber::Decoder::new(bytes);
    let _ = Pdu::decode(&mut decoder, 20);
});
