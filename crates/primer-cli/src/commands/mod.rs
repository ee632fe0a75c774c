pub mod design;
pub mod tm;
