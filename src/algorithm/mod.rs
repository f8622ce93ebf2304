/// Null out grid cells inside an area of interest
pub mod erase;
/// Clip grid values to limits inside an area of interest
pub mod clip;
/// Completion or cancellation result of a row-wise edit
pub mod outcome;
