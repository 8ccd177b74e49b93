pub mod day_service;
