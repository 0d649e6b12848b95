pub mod wpay;

pub use wpay::{apportion_remainder, apportion_rows, apportion_wpay, WpayBreakdown};
