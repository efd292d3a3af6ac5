use serde::Deserialize;
use serde_json::json;

use super::transport::GitLabClient;
use crate::error::Result;

const CURRENT_USER: &str = r#"
query CurrentUser {
    currentUser {
        username
    }
}
"#;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUserData {
    current_user: Option<CurrentUser>,
}

#[derive(Deserialize)]
struct CurrentUser {
    username: String,
}

impl GitLabClient {
    /// Username of the token's owner; `None` for anonymous access.
    pub async fn fetch_current_username(&self) -> Result<Option<String>> {
        let data: CurrentUserData = self
            .execute_graphql_request("CurrentUser", CURRENT_USER, json!({}))
            .await?;

        Ok(data.current_user.map(|u| u.username))
    }
}
