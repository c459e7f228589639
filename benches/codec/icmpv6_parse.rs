use std::net::Ipv6Addr;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use icmpv6_codec::icmpv6::mld::MldRecordType;
use icmpv6_codec::icmpv6::ndp::{AddressRole, NdpMessage};
use icmpv6_codec::{Icmpv6Message, Icmpv6Type, Payload};

const RA_SRC: Ipv6Addr = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
const RA_DST: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);

static RA_BYTES: [u8; 24] = [
    0x86, 0x00, 0xad, 0x61, 0x40, 0x00, 0x07, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x52, 0x54, 0x00, 0x12, 0x34, 0x56,
];

const REPORT_SRC: Ipv6Addr = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 2);
const REPORT_DST: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x16);

static REPORT_BYTES: [u8; 64] = [
    0x8f, 0x00, 0x41, 0x27, 0x00, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0x00, 0xff, 0x02, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xfb, 0x04, 0x00, 0x00, 0x01,
    0xff, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x03,
    0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
];

fn header_only(buf: &[u8]) {
    let msg = Icmpv6Message::decode(buf, RA_SRC, RA_DST);
    assert!(msg.is_valid());
    assert!(msg.msg_type() == Icmpv6Type::ROUTER_ADVERTISEMENT);
    assert!(msg.checksum() == Some(0xad61));
}

fn router_advert(buf: &[u8]) {
    let msg = Icmpv6Message::decode(buf, RA_SRC, RA_DST);
    assert!(msg.is_valid());

    match msg.payload() {
        Some(Payload::Ndp(ndp)) => {
            match ndp.message {
                NdpMessage::RouterAdvertisement(ra) => {
                    assert!(ra.cur_hop_limit == 64);
                    assert!(ra.router_lifetime == 1800);
                }
                _ => panic!(),
            }
            assert!(ndp.link_layer_address(AddressRole::Source) == Some(&RA_BYTES[18..24]));
        }
        _ => panic!(),
    }
}

fn mld_report(buf: &[u8]) {
    let msg = Icmpv6Message::decode(buf, REPORT_SRC, REPORT_DST);
    assert!(msg.is_valid());

    match msg.payload() {
        Some(Payload::MldReport(report)) => {
            assert!(report.groups.len() == 2);
            assert!(report.groups[1].record_type == MldRecordType::CHANGE_TO_EXCLUDE_MODE);
            assert!(report.groups[1].sources.len() == 1);
        }
        _ => panic!(),
    }
}

pub fn b1(c: &mut Criterion) {
    c.bench_function("icmpv6_header", |b| {
        b.iter(|| {
            header_only(black_box(&RA_BYTES[..]));
        })
    });
}

pub fn b2(c: &mut Criterion) {
    c.bench_function("icmpv6_router_advert", |b| {
        b.iter(|| {
            router_advert(black_box(&RA_BYTES[..]));
        })
    });
}

pub fn b3(c: &mut Criterion) {
    c.bench_function("icmpv6_mld_report", |b| {
        b.iter(|| {
            mld_report(black_box(&REPORT_BYTES[..]));
        })
    });
}

criterion_group!(benches, b1, b2, b3);
criterion_main!(benches);
