pub mod contract;
pub mod record;
pub mod recommendation;
pub mod report;
