pub mod organizations;
pub mod tenant;
