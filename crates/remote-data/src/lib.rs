//! Remote data boundary for Simplix
//!
//! This crate defines the collaborator interface to the hosted backend:
//! resource-oriented queries and mutations against named logical tables,
//! one callable aggregation endpoint, and a client-side result cache that
//! is invalidated per resource when a mutation succeeds. Retry, backoff,
//! and authentication are owned by the hosted service client, not here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod resources;

pub use client::{DataSource, Filter, MutationOp, RemoteError, ResourceClient};
pub use resources::{
    Cliente, FunnelStage, Oportunidade, Produto, Resource, SalesSummary, SeriesPoint,
    SummaryPeriod, SummaryTotals, Venda, VendaStatus,
};
