pub mod config_cmd;
pub mod html;
pub mod live_cmd;
pub mod output;
pub mod renderer;
pub mod report_cmd;
