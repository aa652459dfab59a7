pub mod availability_grid;
pub mod mode_picker;

pub use availability_grid::AvailabilityGrid;
pub use mode_picker::ModePicker;
