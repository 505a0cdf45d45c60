//! One module per subcommand, each exposing an `execute` function.

pub mod add;
pub mod change_passphrase;
pub mod generate;
pub mod get;
pub mod init;
pub mod list;
pub mod status;
