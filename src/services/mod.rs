pub mod dashboard;
pub mod providers;
pub mod scope;
pub mod suggestions;
