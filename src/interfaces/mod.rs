pub mod batch;
pub mod csv;
pub mod rpc;
