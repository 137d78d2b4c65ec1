pub mod connectivity;
pub mod projection;
pub mod queue;
pub mod replay;
