pub mod report;

#[cfg(feature = "ui")]
pub mod dashboard;
#[cfg(feature = "ui")]
pub mod design_system;
#[cfg(feature = "ui")]
pub mod forecast_chart;
