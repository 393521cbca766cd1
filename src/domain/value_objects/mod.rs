pub mod enums;
pub mod payments;
pub mod purchases;
