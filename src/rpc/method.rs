//! Method descriptors and the per-kind dispatch logic.
//!
//! A method binds an id to a typed handler.  Request decoding and response
//! encoding come from the handler's serde types, so a descriptor is fully
//! described by `(id, handler, kind)` and built once at startup.

use core::fmt;
use core::marker::PhantomData;

use log::{error, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::context::ServerContext;
use super::message;
use super::packet::Packet;
use super::status::Status;
use super::writer::ServerWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// One request, exactly one reply sent during dispatch.
    Unary,
    /// One request, zero or more replies sent through a `ServerWriter`.
    ServerStreaming,
}

/// Type-erased method entry point.
pub trait Invoke<'o> {
    fn kind(&self) -> MethodKind;

    /// Handle one REQUEST packet addressed to this method.
    fn invoke(&self, ctx: &ServerContext<'o>, request: &Packet<'_>);
}

/// Decode the request payload, or reply ERROR/DATA_LOSS and give up.
fn decode_request<Req: DeserializeOwned>(ctx: &ServerContext<'_>, request: &Packet<'_>) -> Option<Req> {
    match message::decode(request.payload) {
        Ok(req) => Some(req),
        Err(e) => {
            warn!(
                "RPC[{}]: {:08x}/{:08x} bad request: {}",
                ctx.channel_id(),
                ctx.service_id(),
                ctx.method_id(),
                e
            );
            if let Err(e) = ctx.send_error(Status::DataLoss) {
                error!("RPC[{}]: DATA_LOSS reply failed: {}", ctx.channel_id(), e);
            }
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Unary
// ---------------------------------------------------------------------------

/// Handler signature: fill `response`, return the reply status.
pub struct UnaryMethod<Req, Resp, F> {
    handler: F,
    _types: PhantomData<fn(&Req, &mut Resp)>,
}

impl<Req, Resp, F> UnaryMethod<Req, Resp, F>
where
    F: Fn(&ServerContext<'_>, &Req, &mut Resp) -> Status,
{
    pub const fn new(handler: F) -> Self {
        Self {
            handler,
            _types: PhantomData,
        }
    }
}

impl<'o, Req, Resp, F> Invoke<'o> for UnaryMethod<Req, Resp, F>
where
    Req: DeserializeOwned,
    Resp: Serialize + Default,
    F: Fn(&ServerContext<'_>, &Req, &mut Resp) -> Status,
{
    fn kind(&self) -> MethodKind {
        MethodKind::Unary
    }

    fn invoke(&self, ctx: &ServerContext<'o>, request: &Packet<'_>) {
        let Some(req) = decode_request::<Req>(ctx, request) else {
            return;
        };

        let mut response = Resp::default();
        let status = (self.handler)(ctx, &req, &mut response);

        match ctx.send_response(&response, status) {
            Ok(_) => {}
            Err(e) if e.is_buffer_too_small() => {
                // The handler's side effects stand; only the reply changes.
                warn!(
                    "RPC[{}]: {:08x}/{:08x} response does not fit, replying INTERNAL",
                    ctx.channel_id(),
                    ctx.service_id(),
                    ctx.method_id()
                );
                if let Err(e) = ctx.send_error(Status::Internal) {
                    error!("RPC[{}]: INTERNAL reply failed: {}", ctx.channel_id(), e);
                }
            }
            Err(e) => error!("RPC[{}]: response send failed: {}", ctx.channel_id(), e),
        }
    }
}

// ---------------------------------------------------------------------------
// Server streaming
// ---------------------------------------------------------------------------

/// Handler signature: take ownership of the writer; nothing is sent on its
/// behalf.
pub struct ServerStreamingMethod<'o, Req, Resp, F> {
    handler: F,
    _types: PhantomData<fn(&Req, ServerWriter<'o, Resp>)>,
}

impl<'o, Req, Resp, F> ServerStreamingMethod<'o, Req, Resp, F>
where
    F: Fn(&ServerContext<'o>, &Req, ServerWriter<'o, Resp>),
{
    pub const fn new(handler: F) -> Self {
        Self {
            handler,
            _types: PhantomData,
        }
    }
}

impl<'o, Req, Resp, F> Invoke<'o> for ServerStreamingMethod<'o, Req, Resp, F>
where
    Req: DeserializeOwned,
    F: Fn(&ServerContext<'o>, &Req, ServerWriter<'o, Resp>),
{
    fn kind(&self) -> MethodKind {
        MethodKind::ServerStreaming
    }

    fn invoke(&self, ctx: &ServerContext<'o>, request: &Packet<'_>) {
        let Some(req) = decode_request::<Req>(ctx, request) else {
            return;
        };
        let writer = ServerWriter::new(ctx.channel(), ctx.service_id(), ctx.method_id());
        (self.handler)(ctx, &req, writer);
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Immutable `(id, invoker)` pair stored in a service's method table.
#[derive(Clone, Copy)]
pub struct Method<'o> {
    id: u32,
    invoker: &'o dyn Invoke<'o>,
}

impl<'o> Method<'o> {
    pub const fn new(id: u32, invoker: &'o dyn Invoke<'o>) -> Self {
        Self { id, invoker }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> MethodKind {
        self.invoker.kind()
    }

    pub fn invoke(&self, ctx: &ServerContext<'o>, request: &Packet<'_>) {
        self.invoker.invoke(ctx, request);
    }
}

impl fmt::Debug for Method<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}
