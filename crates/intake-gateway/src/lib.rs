//! Submission of finished intake records to the persistence service.
//!
//! [`RecordSink`] is the network seam; [`HttpRecordSink`] is the production
//! implementation. [`SubmissionGateway`] turns a sink response into an outcome
//! and the operator notification that goes with it.

pub mod error;
pub mod gateway;
pub mod sink;

pub use error::GatewayError;
pub use gateway::{Submission, SubmissionGateway, SubmissionOutcome};
pub use sink::{HttpRecordSink, RecordSink, SinkResponse};
