pub mod gateway;
pub mod login;
pub mod password;
pub mod register;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;
