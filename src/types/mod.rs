pub mod openpack;
pub mod user;
