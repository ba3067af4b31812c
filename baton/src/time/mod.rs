mod jiffy;
pub(crate) mod timer_manager;

pub use jiffy::JIFFIES_PER_SECOND;
pub use jiffy::Jiffies;
