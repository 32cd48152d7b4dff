mod setup;

pub use setup::run_setup;
