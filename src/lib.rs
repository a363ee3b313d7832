pub mod account;
pub mod activity;
pub mod cli;
pub mod completion;
pub mod config;
pub mod job;
pub mod manual;
pub mod output;
pub mod printer;
pub mod recipient;
pub mod report;
pub mod session;
pub mod ui;
