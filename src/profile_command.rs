use anyhow::{Context, Result};
use log::info;

use crate::profile::UserProfile;
use crate::storage::{BlobStore, LogStore};

/// 利用者情報を操作するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ProfileArgs {
    #[clap(subcommand)]
    action: ProfileAction,
}

#[derive(Debug, clap::Subcommand)]
pub enum ProfileAction {
    #[clap(about = "Shows the profile")]
    Show,
    #[clap(about = "Logs in, as a guest when no user is given")]
    Login {
        #[clap(long, requires = "email")]
        username: Option<String>,
        #[clap(long, requires = "username")]
        email: Option<String>,
        #[clap(long, requires = "username", help = "URI of the profile picture")]
        picture: Option<String>,
    },
    #[clap(about = "Logs out and clears the profile")]
    Logout,
}

pub struct ProfileCommand<'a, S: BlobStore> {
    log_store: &'a LogStore<S>,
}

impl<'a, S: BlobStore> ProfileCommand<'a, S> {
    /// 新しい`ProfileCommand`を返す。
    pub fn new(log_store: &'a LogStore<S>) -> Self {
        Self { log_store }
    }

    /// `profile`サブコマンドの処理を行い、処理後の利用者情報を返す。
    pub fn run(&self, profile: ProfileArgs) -> Result<UserProfile> {
        let mut user = self
            .log_store
            .load_profile()
            .context("Failed to load user profile")?;

        match profile.action {
            ProfileAction::Show => return Ok(user),
            ProfileAction::Login {
                username: Some(username),
                email: Some(email),
                picture,
            } => user.set_user_info(username, email, picture),
            ProfileAction::Login { .. } => user.set_logged_in(true),
            ProfileAction::Logout => user.logout(),
        }

        self.log_store
            .save_profile(&user)
            .context("Failed to save user profile")?;
        info!("Profile saved for {}", user.display_name());

        Ok(user)
    }
}
