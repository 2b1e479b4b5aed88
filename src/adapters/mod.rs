pub mod mock;
pub mod postgres;
pub mod smtp;
