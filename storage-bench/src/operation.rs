use bytes::Bytes;
use rand::RngCore;
use std::future::Future;
use std::sync::Arc;
use storage_bench_client::Client;
use tokio_util::sync::CancellationToken;

use crate::result::{OpOutput, Outcome, PhaseCost};

/// Per-invocation context handed to a [`TimedOperation`].
#[derive(Debug, Clone)]
pub struct OpContext {
    pub slot_id: usize,
    pub sequence_id: u64,
    /// Cancelled when the run deadline passes. An operation may use it to
    /// give up early, but it still returns an output.
    pub cancel: CancellationToken,
}

/// One unit of work against the storage endpoint.
///
/// Failures are reported through [`Outcome::Failure`], never by panicking or
/// by returning early without an output.
pub trait TimedOperation: Send + 'static {
    fn execute(&mut self, ctx: &OpContext) -> impl Future<Output = OpOutput> + Send;
}

/// Object name used by slot `slot_id` for its `sequence_id`-th upload.
pub fn object_name(prefix: &str, slot_id: usize, sequence_id: u64) -> String {
    format!("{prefix}-{slot_id:03}{sequence_id:03}")
}

/// Random payload reused for every upload a slot makes.
pub fn generate_payload(rng: &mut impl RngCore, size: usize) -> Bytes {
    let mut data = vec![0u8; size];
    rng.fill_bytes(&mut data);
    Bytes::from(data)
}

/// Uploads a fresh object per invocation.
pub struct PutObject {
    client: Arc<Client>,
    prefix: String,
    payload: Bytes,
}

impl PutObject {
    pub fn new(client: Arc<Client>, prefix: impl Into<String>, payload: Bytes) -> Self {
        Self { client, prefix: prefix.into(), payload }
    }
}

impl TimedOperation for PutObject {
    async fn execute(&mut self, ctx: &OpContext) -> OpOutput {
        let name = object_name(&self.prefix, ctx.slot_id, ctx.sequence_id);
        match self.client.put_object(&name, self.payload.clone()).await {
            Ok(t) => OpOutput::new(
                vec![
                    PhaseCost::new("send", t.headers_after),
                    PhaseCost::new("drain", t.total.saturating_sub(t.headers_after)),
                ],
                Outcome::success(t.status.to_string()),
            ),
            Err(e) => OpOutput::new(Vec::new(), Outcome::failure(e)),
        }
    }
}

/// Downloads the same object on every invocation.
pub struct GetObject {
    client: Arc<Client>,
    object: String,
}

impl GetObject {
    pub fn new(client: Arc<Client>, object: impl Into<String>) -> Self {
        Self { client, object: object.into() }
    }
}

impl TimedOperation for GetObject {
    async fn execute(&mut self, _ctx: &OpContext) -> OpOutput {
        match self.client.get_object(&self.object).await {
            Ok(t) => OpOutput::new(
                vec![
                    PhaseCost::new("headers", t.headers_after),
                    PhaseCost::new("body", t.total.saturating_sub(t.headers_after)),
                ],
                Outcome::success(t.status.to_string()),
            ),
            Err(e) => OpOutput::new(Vec::new(), Outcome::failure(e)),
        }
    }
}

/// The operation selected on the command line.
pub enum ObjectOperation {
    Put(PutObject),
    Get(GetObject),
}

impl TimedOperation for ObjectOperation {
    async fn execute(&mut self, ctx: &OpContext) -> OpOutput {
        match self {
            ObjectOperation::Put(op) => op.execute(ctx).await,
            ObjectOperation::Get(op) => op.execute(ctx).await,
        }
    }
}
