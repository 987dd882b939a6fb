mod load;
mod structs;

pub use structs::*;
