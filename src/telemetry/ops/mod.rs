pub mod poll;
pub mod feed;
pub mod status;
pub mod init;
pub mod run;
