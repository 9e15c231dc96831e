pub mod content;
pub mod loading;
pub mod ui;
