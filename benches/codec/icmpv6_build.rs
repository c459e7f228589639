use std::net::Ipv6Addr;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use icmpv6_codec::icmpv6::mld::{MldRecordType, MulticastGroupRecord};
use icmpv6_codec::icmpv6::ndp::{NdpMessage, NdpOption, NdpPayload, RouterAdvertisement};
use icmpv6_codec::{Icmpv6Message, Icmpv6Type, Payload};

const SRC: Ipv6Addr = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
const DST: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);

static MAC: [u8; 6] = [0x52, 0x54, 0x00, 0x12, 0x34, 0x56];
static ECHO_DATA: [u8; 56] = [0xab; 56];

fn build_echo(buf: &mut [u8]) {
    let msg = Icmpv6Message::echo_request(SRC, DST, 0x1234, 1, Bytes::from_static(&ECHO_DATA));
    let len = msg.encode(buf).unwrap();
    assert!(len == 64);
}

fn build_router_advert(buf: &mut [u8]) {
    let ndp = NdpPayload::new(
        NdpMessage::RouterAdvertisement(RouterAdvertisement {
            cur_hop_limit: 64,
            managed: false,
            other_config: false,
            flags: 0,
            router_lifetime: 1800,
            reachable_time: 0,
            retrans_timer: 0,
        }),
        vec![NdpOption::source_link_addr(Bytes::from_static(&MAC))],
    );
    let msg = Icmpv6Message::new(
        SRC,
        DST,
        Icmpv6Type::ROUTER_ADVERTISEMENT,
        0,
        Some(Payload::Ndp(ndp)),
    )
    .unwrap();
    let len = msg.encode(buf).unwrap();
    assert!(len == 24);
    assert!(buf[2..4] == [0xad, 0x61]);
}

fn build_mld_report(buf: &mut [u8]) {
    let msg = Icmpv6Message::mld_report(
        SRC,
        DST,
        vec![
            MulticastGroupRecord::new(
                MldRecordType::MODE_IS_EXCLUDE,
                Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb),
                vec![],
            ),
            MulticastGroupRecord::new(
                MldRecordType::ALLOW_NEW_SOURCES,
                Ipv6Addr::new(0xff05, 0, 0, 0, 0, 0, 1, 3),
                vec![SRC; 4],
            ),
        ],
    );
    let len = msg.encode(buf).unwrap();
    assert!(len == 8 + 20 + 20 + 64);
}

pub fn b1(c: &mut Criterion) {
    let mut buf = [0u8; 1500];
    c.bench_function("icmpv6_build_echo", |b| {
        b.iter(|| {
            build_echo(black_box(&mut buf[..]));
        })
    });
}

pub fn b2(c: &mut Criterion) {
    let mut buf = [0u8; 1500];
    c.bench_function("icmpv6_build_router_advert", |b| {
        b.iter(|| {
            build_router_advert(black_box(&mut buf[..]));
        })
    });
}

pub fn b3(c: &mut Criterion) {
    let mut buf = [0u8; 1500];
    c.bench_function("icmpv6_build_mld_report", |b| {
        b.iter(|| {
            build_mld_report(black_box(&mut buf[..]));
        })
    });
}

criterion_group!(benches, b1, b2, b3);
criterion_main!(benches);
