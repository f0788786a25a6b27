pub mod apps;
pub mod backup;
pub mod config;
pub mod init;
pub mod perms;
pub mod process;
pub mod setup;
pub mod site;
