pub mod quote;
pub mod serve;
pub mod status;
