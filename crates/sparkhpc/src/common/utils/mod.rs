pub mod fs;
pub mod size;
pub mod str;
pub mod time;
