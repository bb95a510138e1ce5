//! The `accounts check` command: validate each stored credential's session.

use anyhow::Context as _;

use kolstat_api::SolarClient;
use kolstat_collect::{Account, AccountStatus, JsonFileStore, PersistenceStore};
use kolstat_core::AppConfig;

pub(crate) async fn run_accounts_check(config: &AppConfig) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.accounts_path);
    let mut accounts: Vec<Account> = match store.load("accounts")? {
        Some(value) => serde_json::from_value(value).context("parsing stored accounts")?,
        None => Vec::new(),
    };
    anyhow::ensure!(
        !accounts.is_empty(),
        "no accounts configured — add credentials to {} first",
        config.accounts_path.display()
    );

    let client = SolarClient::new(
        &config.base_url,
        config.request_timeout_secs,
        &config.user_agent,
        &config.referer,
    )
    .context("building platform client")?;

    for account in &mut accounts {
        match client.user_info(&account.cookie).await {
            Ok(info) => {
                account.status = AccountStatus::Active;
                if let Some(role) = info.role_info_list.first() {
                    account.name = role.nick_name.clone();
                }
                println!("account '{}': ok ({})", account.id, account.name);
            }
            Err(err) => {
                tracing::warn!(account = %account.id, error = %err, "session validation failed");
                account.status = AccountStatus::Invalid;
                println!("account '{}': invalid ({err})", account.id);
            }
        }
    }

    store.save("accounts", serde_json::to_value(&accounts)?)?;
    Ok(())
}
