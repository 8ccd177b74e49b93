pub mod date_key;
pub mod day;
