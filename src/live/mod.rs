mod computer;
mod counter;
mod loader;
mod matrix;

pub use computer::LiveMeasureComputer;
pub use counter::IssueCounter;
pub use loader::MatrixLoader;
pub use matrix::MeasureMatrix;
