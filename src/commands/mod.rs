pub mod results_view;
pub mod session;
