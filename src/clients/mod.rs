pub mod on_this_day;
pub mod planner_client;
