use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smoltcp::wire;

static RA_BYTES: [u8; 24] = [
    0x86, 0x00, 0xad, 0x61, 0x40, 0x00, 0x07, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x01, 0x52, 0x54, 0x00, 0x12, 0x34, 0x56,
];

fn src_addr() -> wire::IpAddress {
    wire::IpAddress::Ipv6(wire::Ipv6Address::new(0xfe80, 0, 0, 0, 0, 0, 0, 1))
}

fn dst_addr() -> wire::IpAddress {
    wire::IpAddress::Ipv6(wire::Ipv6Address::new(0xff02, 0, 0, 0, 0, 0, 0, 1))
}

fn smol_header(buf: &[u8]) {
    let pkt = wire::Icmpv6Packet::new_checked(buf).unwrap();
    assert!(pkt.verify_checksum(&src_addr(), &dst_addr()));
    assert!(pkt.msg_type() == wire::Icmpv6Message::RouterAdvert);
    assert!(pkt.checksum() == 0xad61);
}

fn smol_router_advert(buf: &[u8]) {
    let pkt = wire::Icmpv6Packet::new_checked(buf).unwrap();
    assert!(pkt.verify_checksum(&src_addr(), &dst_addr()));

    let repr = wire::NdiscRepr::parse(&pkt).unwrap();
    match repr {
        wire::NdiscRepr::RouterAdvert {
            hop_limit,
            router_lifetime,
            lladdr,
            ..
        } => {
            assert!(hop_limit == 64);
            assert!(router_lifetime == smoltcp::time::Duration::from_secs(1800));
            assert!(lladdr.is_some());
        }
        _ => panic!(),
    }
}

pub fn b1(c: &mut Criterion) {
    c.bench_function("smol_icmpv6_header", |b| {
        b.iter(|| {
            smol_header(black_box(&RA_BYTES[..]));
        })
    });
}

pub fn b2(c: &mut Criterion) {
    c.bench_function("smol_icmpv6_router_advert", |b| {
        b.iter(|| {
            smol_router_advert(black_box(&RA_BYTES[..]));
        })
    });
}

criterion_group!(benches, b1, b2);
criterion_main!(benches);
