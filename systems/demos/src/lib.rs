pub mod masterslave;
pub mod pingpong;
pub mod start_kill_time;
pub mod suspend;
