//! Server-streaming dispatch and the retained `ServerWriter`.

use core::cell::RefCell;

use hdlcrpc::rpc::message;
use hdlcrpc::rpc::{
    Method, MethodKind, Packet, PacketType, ServerContext, ServerStreamingMethod, ServerWriter,
    Status,
};

use crate::mock_output::{TestRequest, TestResponse, payload, test_channel};

const SERVICE_ID: u32 = 16;
const METHOD_ID: u32 = 222;

fn request(bytes: &[u8]) -> Packet<'_> {
    Packet::new(PacketType::Request, 1, SERVICE_ID, METHOD_ID, bytes)
}

// ── Silence, then writes ──────────────────────────────────────

#[test]
fn invoke_sends_nothing_and_writes_check_capacity() {
    // 18-byte header + at most one payload byte.
    let channel = test_channel::<19>(1);
    let writer_slot: RefCell<Option<ServerWriter<'_, TestResponse>>> = RefCell::new(None);
    let last_request = RefCell::new(None);
    let stream = ServerStreamingMethod::new(|_, req: &TestRequest, writer| {
        *last_request.borrow_mut() = Some(req.clone());
        *writer_slot.borrow_mut() = Some(writer);
    });
    let method = Method::new(METHOD_ID, &stream);
    assert_eq!(method.kind(), MethodKind::ServerStreaming);

    let bytes = payload(&TestRequest { integer: -99 });
    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(&bytes));

    assert_eq!(*last_request.borrow(), Some(TestRequest { integer: -99 }));
    channel.with_output(|out| assert_eq!(out.packet_count(), 0));

    let slot = writer_slot.borrow();
    let writer = slot.as_ref().unwrap();
    assert!(writer.is_open());

    assert_eq!(writer.write(&TestResponse { value: 0 }), Status::Ok);
    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        let reply = out.packet(0);
        assert_eq!(reply.packet_type, PacketType::Response);
        assert_eq!(reply.status, Status::Ok);
        assert_eq!(reply.service_id, SERVICE_ID);
        assert_eq!(reply.method_id, METHOD_ID);
    });

    // Two payload bytes no longer fit; nothing is sent and no error
    // envelope is substituted.
    assert_eq!(writer.write(&TestResponse { value: 1000 }), Status::Internal);
    channel.with_output(|out| assert_eq!(out.packet_count(), 1));
    assert!(writer.is_open());
}

// ── Retained writer ───────────────────────────────────────────

#[test]
fn retained_writer_streams_then_finishes() {
    let channel = test_channel::<64>(7);
    let writer_slot: RefCell<Option<ServerWriter<'_, TestResponse>>> = RefCell::new(None);
    let stream = ServerStreamingMethod::new(|_, _: &TestRequest, writer| {
        *writer_slot.borrow_mut() = Some(writer);
    });
    let method = Method::new(METHOD_ID, &stream);

    let bytes = payload(&TestRequest { integer: 3 });
    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(&bytes));

    // Dispatch has returned; the application drives the stream from here.
    let mut writer = writer_slot.borrow_mut().take().unwrap();
    for value in 1..=3 {
        assert_eq!(writer.write(&TestResponse { value }), Status::Ok);
    }
    assert_eq!(writer.finish(Status::Ok), Status::Ok);
    assert_eq!(writer.write(&TestResponse { value: 4 }), Status::FailedPrecondition);

    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 4);
        for (i, expected) in (1..=3).enumerate() {
            let reply = out.packet(i);
            assert_eq!(reply.channel_id, 7);
            let response: TestResponse = message::decode(reply.payload).unwrap();
            assert_eq!(response.value, expected);
        }
        let end = out.packet(3);
        assert_eq!(end.packet_type, PacketType::ServerStreamEnd);
        assert_eq!(end.status, Status::Ok);
        assert!(end.payload.is_empty());
    });
}

// ── Decode failure ────────────────────────────────────────────

#[test]
fn undecodable_stream_request_gets_data_loss() {
    let channel = test_channel::<64>(1);
    let writer_slot: RefCell<Option<ServerWriter<'_, TestResponse>>> = RefCell::new(None);
    let stream = ServerStreamingMethod::new(|_, _: &TestRequest, writer| {
        *writer_slot.borrow_mut() = Some(writer);
    });
    let method = Method::new(METHOD_ID, &stream);

    method.invoke(&ServerContext::new(&channel, SERVICE_ID, METHOD_ID), &request(&[0x80]));

    assert!(writer_slot.borrow().is_none());
    channel.with_output(|out| {
        assert_eq!(out.packet_count(), 1);
        let reply = out.packet(0);
        assert_eq!(reply.packet_type, PacketType::Error);
        assert_eq!(reply.status, Status::DataLoss);
    });
}
