mod dev;
mod envs;
mod init;
mod reconcile;
mod secrets;

pub use dev::cmd_dev;
pub use envs::cmd_envs;
pub use init::cmd_init;
pub use reconcile::cmd_reconcile;
pub use secrets::cmd_detect_secrets;
