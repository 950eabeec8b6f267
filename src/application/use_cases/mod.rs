pub mod design;
pub mod profiles;
