// GUI layer: the eframe app shell and the pane renderer
pub mod app;
pub mod panes;

pub use app::OutlookApp;
