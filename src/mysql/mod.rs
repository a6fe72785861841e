//! Launching the mysql command line clients against a tunnelled database.

pub mod exec;
pub mod runner;

pub use exec::{ExecWrapper, OsExecWrapper};
pub use runner::{MysqlRunner, MysqlRunnerImpl, MysqlTarget};
