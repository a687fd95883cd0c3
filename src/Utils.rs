//! different utility modules used throughout the project
/// tiny module to save fit history into file
pub mod logger;
/// tiny module to plot the fitted curve and the cost history
pub mod plots;
