pub mod check;
pub mod invoke;
pub mod profile;
pub mod serve;
pub mod token;
