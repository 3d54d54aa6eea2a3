pub mod analytics;
pub mod listings;
pub mod segmentation;
