use clap::{Parser, Subcommand};

/// cf-mysql: MySQL clients for databases reachable only from inside Cloud Foundry
#[derive(Parser, Debug)]
#[command(name = "cf-mysql", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Open an interactive MySQL session with a database service
    Mysql {
        /// Name of the database service instance
        service: Option<String>,

        /// Passed on to the mysql client
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Dump a database service with mysqldump
    Mysqldump {
        /// Name of the database service instance
        service: Option<String>,

        /// Table names first, then options passed on to mysqldump
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List MySQL databases bound to an app in the current space
    List,
}
