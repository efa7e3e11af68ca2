use serde::{Deserialize, Serialize};

/// 端末の利用者情報。エントリーとは関連付けない。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl UserProfile {
    pub fn set_logged_in(&mut self, status: bool) {
        self.logged_in = status;
    }

    /// 利用者情報を設定し、ログイン済みにする。
    pub fn set_user_info(&mut self, username: String, email: String, picture: Option<String>) {
        self.username = Some(username);
        self.email = Some(email);
        self.profile_picture = picture;
        self.logged_in = true;
    }

    /// ログアウトし、利用者情報を消去する。
    pub fn logout(&mut self) {
        *self = Self::default();
    }

    /// 表示名を返す。
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Guest")
    }
}
