pub mod check;
pub mod extract;
pub mod profile;
