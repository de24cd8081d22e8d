//! Session commands driven by the command-line front end.
//!
//! - [`Session::select_paths`]: replace the selection
//! - [`Session::convert`]: run the batch over the selection
//! - [`Session::download_all`] / [`Session::download`]: save results

mod session;

pub use session::Session;
