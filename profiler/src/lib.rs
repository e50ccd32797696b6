pub mod backend;
pub mod badge;
pub mod controller;
pub mod event;
pub mod format;
pub mod host;
pub mod report;
pub mod run;
pub mod tick;
pub mod tracker;
