pub mod apply;
pub mod artifact;
pub mod auth;
pub mod destroy;
pub mod generate;
pub mod init;

pub use apply::ApplyCommand;
pub use artifact::ArtifactCommand;
pub use auth::AuthCommand;
pub use destroy::DestroyCommand;
pub use generate::GenerateCommand;
pub use init::InitCommand;
