pub mod openpack;
pub mod sites;
pub mod users;
