pub mod entity;
pub mod question;
