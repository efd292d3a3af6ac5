use super::raw::RawAccount;
use super::types::Account;

const ME: &str = "me";

/// Resolves a raw account against the operator's username.
///
/// `display_name` is `"me"` for the operator and the first whitespace-delimited
/// token of `name` for everyone else. An empty or blank `name` falls back to the
/// username so the UI never shows an empty label.
pub fn resolve_identity(account: RawAccount, my_username: Option<&str>) -> Account {
    let is_me = my_username.is_some_and(|me| me == account.username);

    let display_name = if is_me {
        ME.to_string()
    } else {
        first_name(&account)
    };

    Account {
        name: account.name,
        username: account.username,
        is_me,
        display_name,
    }
}

fn first_name(account: &RawAccount) -> String {
    account
        .name
        .split_whitespace()
        .next()
        .unwrap_or(&account.username)
        .to_string()
}
