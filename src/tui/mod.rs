mod app;

pub use app::{App, EnvRow, Focus};
