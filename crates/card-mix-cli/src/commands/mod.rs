pub mod assumptions;
pub mod classify;
pub mod incentives;
pub mod model;
pub mod reports;
pub mod scenario;
