pub mod calendar;
pub mod plan;
pub mod run;
pub mod session;
