pub mod results_panel;
pub mod spectrum_view;
pub mod theme;
pub mod toolbar;
