pub mod config;
pub mod dashboard;
pub mod detect;
pub mod formatter;
pub mod live;
pub mod models;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod sanitize;
pub mod state;
pub mod table;
pub mod view;
