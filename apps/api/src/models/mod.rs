pub mod notification;
pub mod profile;
pub mod ticket;
