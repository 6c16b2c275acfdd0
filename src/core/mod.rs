pub mod assessment;
pub mod gateway;
