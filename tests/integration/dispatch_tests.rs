//! Unary dispatch: request decoding, handler status and the capacity
//! fallback.

use core::cell::{Cell, RefCell};

use hdlcrpc::rpc::message;
use hdlcrpc::rpc::{Method, Packet, PacketType, RpcChannel, ServerContext, Status, UnaryMethod};

use crate::mock_output::{TestRequest, TestResponse, payload, test_channel};

const SERVICE_ID: u32 = 16;
const METHOD_ID: u32 = 111;

fn request(channel_id: u32, bytes: &[u8]) -> Packet<'_> {
    Packet::new(PacketType::Request, channel_id, SERVICE_ID, METHOD_ID, bytes)
}

// ── Handler status and response ───────────────────────────────

#[test]
fn unary_reply_carries_handler_status_and_response() {
    let channel = test_channel::<128>(1);
    let last_request = RefCell::new(None);
    let add_five = UnaryMethod::new(
        |_: &ServerContext<'_>, req: &TestRequest, resp: &mut TestResponse| {
            *last_request.borrow_mut() = Some(req.clone());
            resp.value = req.integer + 5;
            Status::Unauthenticated
        },
    );
    let method = Method::new(METHOD_ID, &add_five);

    let bytes = payload(&TestRequest { integer: 123 });
    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(1, &bytes));

    assert_eq!(*last_request.borrow(), Some(TestRequest { integer: 123 }));
    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        let reply = out.packet(0);
        assert_eq!(reply.packet_type, PacketType::Response);
        assert_eq!(reply.status, Status::Unauthenticated);
        assert_eq!(reply.channel_id, 1);
        assert_eq!(reply.service_id, SERVICE_ID);
        assert_eq!(reply.method_id, METHOD_ID);
        let response: TestResponse = message::decode(reply.payload).unwrap();
        assert_eq!(response.value, 128);
    });
}

// ── Request decode failure ────────────────────────────────────

#[test]
fn invalid_payload_sends_data_loss_and_skips_handler() {
    let channel = test_channel::<128>(1);
    let called = Cell::new(false);
    let add_five = UnaryMethod::new(
        |_: &ServerContext<'_>, _: &TestRequest, _: &mut TestResponse| {
            called.set(true);
            Status::Ok
        },
    );
    let method = Method::new(METHOD_ID, &add_five);

    // A varint that never terminates.
    let bad = [0xFF, 0xFF, 0xFF];
    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(1, &bad));

    assert!(!called.get(), "handler must not run on undecodable input");
    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        let reply = out.packet(0);
        assert_eq!(reply.packet_type, PacketType::Error);
        assert_eq!(reply.status, Status::DataLoss);
        assert_eq!(reply.service_id, SERVICE_ID);
        assert_eq!(reply.method_id, METHOD_ID);
        assert!(reply.payload.is_empty());
    });
}

#[test]
fn trailing_bytes_are_a_decode_failure() {
    let channel = test_channel::<128>(1);
    let add_five = UnaryMethod::new(
        |_: &ServerContext<'_>, _: &TestRequest, _: &mut TestResponse| Status::Ok,
    );
    let method = Method::new(METHOD_ID, &add_five);

    let mut bytes = payload(&TestRequest { integer: 1 });
    bytes.push(0x00);
    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(1, &bytes));

    channel.with_output(|out| assert_eq!(out.last_packet().unwrap().status, Status::DataLoss));
}

// ── Capacity fallback ─────────────────────────────────────────

#[test]
fn oversized_response_becomes_internal_error() {
    // Room for an 18-byte error envelope but not a 28-byte response.
    let channel = test_channel::<22>(1);
    let last_request = RefCell::new(None);
    let add_five = UnaryMethod::new(
        |_: &ServerContext<'_>, req: &TestRequest, resp: &mut TestResponse| {
            *last_request.borrow_mut() = Some(req.clone());
            resp.value = req.integer + 5;
            Status::Ok
        },
    );
    let method = Method::new(METHOD_ID, &add_five);

    let bytes = payload(&TestRequest { integer: i64::MAX - 5 });
    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(1, &bytes));

    // The handler ran to completion; its side effect stands.
    assert_eq!(
        *last_request.borrow(),
        Some(TestRequest { integer: i64::MAX - 5 })
    );
    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        let reply = out.packet(0);
        assert_eq!(reply.packet_type, PacketType::Error);
        assert_eq!(reply.status, Status::Internal);
        assert_eq!(reply.service_id, SERVICE_ID);
        assert_eq!(reply.method_id, METHOD_ID);
    });
}

#[test]
fn buffer_smaller_than_any_envelope_sends_nothing() {
    let channel = test_channel::<8>(1);
    let add_five = UnaryMethod::new(
        |_: &ServerContext<'_>, _: &TestRequest, _: &mut TestResponse| Status::Ok,
    );
    let method = Method::new(METHOD_ID, &add_five);

    let bytes = payload(&TestRequest { integer: 0 });
    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(1, &bytes));

    channel.with_output(|out| assert_eq!(out.packet_count(), 0));
    assert_eq!(RpcChannel::buffer_size(&channel), 8);
}
