pub mod calendar;
pub mod controller;
