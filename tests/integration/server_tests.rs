//! Packet routing through `Server::process_packet`.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use hdlcrpc::Error;
use hdlcrpc::error::PacketError;
use hdlcrpc::rpc::message;
use hdlcrpc::rpc::{
    Channel, Method, Packet, PacketType, RpcChannel, Server, ServerContext, Service, Status,
    UnaryMethod,
};

use crate::mock_output::{Empty, RecordingOutput, TestRequest, TestResponse, payload, test_channel};

const MATH_SERVICE: u32 = 0x0000_0010;
const ADD_FIVE: u32 = 0x0000_0001;
const ECHO_SERVICE: u32 = 0x0000_0020;
const ECHO: u32 = 0x0000_0002;

fn encode(packet: &Packet<'_>) -> Vec<u8> {
    let mut buf = vec![0u8; packet.encoded_size()];
    packet.encode(&mut buf).unwrap();
    buf
}

fn call(channel_id: u32, service_id: u32, method_id: u32, body: &[u8]) -> Vec<u8> {
    encode(&Packet::new(PacketType::Request, channel_id, service_id, method_id, body))
}

// ── Routing ───────────────────────────────────────────────────

#[test]
fn replies_go_to_the_requesting_channel() {
    let uart = test_channel::<64>(1);
    let usb = test_channel::<64>(2);
    let calls = Cell::new(0);

    let add_five = UnaryMethod::new(
        |ctx: &ServerContext<'_>, req: &TestRequest, resp: &mut TestResponse| {
            calls.set(calls.get() + 1);
            assert_eq!(ctx.service_id(), MATH_SERVICE);
            resp.value = req.integer + 5;
            Status::Ok
        },
    );
    let echo = UnaryMethod::new(|_: &ServerContext<'_>, req: &Empty, resp: &mut Empty| {
        *resp = req.clone();
        Status::Ok
    });
    let math_methods = [Method::new(ADD_FIVE, &add_five)];
    let echo_methods = [Method::new(ECHO, &echo)];
    let services = [
        Service::new(MATH_SERVICE, "Math", &math_methods),
        Service::new(ECHO_SERVICE, "Echo", &echo_methods),
    ];
    let channels: [&dyn RpcChannel; 2] = [&uart, &usb];
    let server = Server::new(&channels, &services);

    let body = payload(&TestRequest { integer: 10 });
    server.process_packet(&call(2, MATH_SERVICE, ADD_FIVE, &body)).unwrap();
    server.process_packet(&call(1, ECHO_SERVICE, ECHO, &[])).unwrap();

    assert_eq!(calls.get(), 1);
    usb.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        let reply = out.packet(0);
        assert_eq!(reply.channel_id, 2);
        let response: TestResponse = message::decode(reply.payload).unwrap();
        assert_eq!(response.value, 15);
    });
    uart.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        assert_eq!(out.packet(0).service_id, ECHO_SERVICE);
    });
    assert_eq!(server.service(ECHO_SERVICE).map(Service::name), Some("Echo"));
}

#[test]
fn unknown_service_or_method_is_not_found() {
    let channel = test_channel::<64>(1);
    let echo = UnaryMethod::new(|_: &ServerContext<'_>, _: &Empty, _: &mut Empty| Status::Ok);
    let methods = [Method::new(ECHO, &echo)];
    let services = [Service::new(ECHO_SERVICE, "Echo", &methods)];
    let channels: [&dyn RpcChannel; 1] = [&channel];
    let server = Server::new(&channels, &services);

    server.process_packet(&call(1, ECHO_SERVICE, 0xDEAD, &[])).unwrap();
    server.process_packet(&call(1, 0xBEEF, ECHO, &[])).unwrap();

    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 2);
        for (i, (service_id, method_id)) in [(ECHO_SERVICE, 0xDEAD), (0xBEEF, ECHO)].into_iter().enumerate() {
            let reply = out.packet(i);
            assert_eq!(reply.packet_type, PacketType::Error);
            assert_eq!(reply.status, Status::NotFound);
            assert_eq!(reply.service_id, service_id);
            assert_eq!(reply.method_id, method_id);
        }
    });
}

// ── Rejections ────────────────────────────────────────────────

#[test]
fn unknown_channel_is_reported_to_caller() {
    let channel = test_channel::<64>(1);
    let channels: [&dyn RpcChannel; 1] = [&channel];
    let server = Server::new(&channels, &[]);

    assert_eq!(
        server.process_packet(&call(9, ECHO_SERVICE, ECHO, &[])),
        Err(Error::UnknownChannel(9))
    );
    channel.with_output(|out| assert_eq!(out.packet_count(), 0));
}

#[test]
fn truncated_packet_is_malformed() {
    let server = Server::new(&[], &[]);
    let mut bytes = call(1, ECHO_SERVICE, ECHO, &[1, 2, 3]);
    bytes.pop();
    assert!(matches!(
        server.process_packet(&bytes),
        Err(Error::Packet(PacketError::Malformed(_)))
    ));
}

#[test]
fn responses_sent_to_server_are_ignored() {
    let channel = test_channel::<64>(1);
    let channels: [&dyn RpcChannel; 1] = [&channel];
    let server = Server::new(&channels, &[]);

    let response = encode(&Packet::new(PacketType::Response, 1, ECHO_SERVICE, ECHO, &[]));
    assert_eq!(server.process_packet(&response), Ok(()));
    channel.with_output(|out| assert_eq!(out.packet_count(), 0));
}

// ── Shared channel ────────────────────────────────────────────

#[test]
fn critical_section_channel_serves_requests() {
    let channel: Channel<CriticalSectionRawMutex, RecordingOutput<64>> =
        Channel::new(3, RecordingOutput::new());
    let echo = UnaryMethod::new(|_: &ServerContext<'_>, _: &Empty, _: &mut Empty| Status::Ok);
    let methods = [Method::new(ECHO, &echo)];
    let services = [Service::new(ECHO_SERVICE, "Echo", &methods)];
    let channels: [&dyn RpcChannel; 1] = [&channel];
    let server = Server::new(&channels, &services);

    server.process_packet(&call(3, ECHO_SERVICE, ECHO, &[])).unwrap();
    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        assert_eq!(out.packet(0).status, Status::Ok);
    });
}
