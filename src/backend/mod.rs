pub mod cache;
pub mod catalog;
pub mod fetch;
pub mod playback;
pub mod preloader;
pub mod progress;

#[cfg(test)]
pub mod test_server;
