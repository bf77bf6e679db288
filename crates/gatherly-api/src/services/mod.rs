// DTO assembly from storage rows

pub mod event;
pub mod user;
