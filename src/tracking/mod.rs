pub mod proximity;
pub mod source;
pub mod tracker;
