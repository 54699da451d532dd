pub mod delivery;
pub mod geo;
pub mod route;
pub mod session;
