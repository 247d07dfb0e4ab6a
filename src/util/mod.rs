// Utility modules

pub mod delay;
pub mod encode;
