pub mod forecast;
pub mod plot;
