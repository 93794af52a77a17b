mod borrow;
mod charge;
mod status;

pub use borrow::BorrowRecord;
pub use charge::OverageCharge;
pub use status::LicenseStatus;
