// Domain layer - View models and the power history buffer
pub mod dashboard;
pub mod power;
pub mod time_series;
pub mod vehicle;
pub mod wallbox;
