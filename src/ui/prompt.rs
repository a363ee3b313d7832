use anyhow::Result;
use dialoguer::{Confirm, Input};
use email_address::EmailAddress;
use std::str::FromStr;

use super::THEME;

/// Asks for the address of the mailing list or group to check.
pub(crate) fn address() -> Result<String> {
    let address = Input::<String>::with_theme(&*THEME)
        .with_prompt("Address of the mailing list or group")
        .validate_with(|input: &String| -> Result<(), String> {
            EmailAddress::from_str(input.trim())
                .map(|_| ())
                .map_err(|err| err.to_string())
        })
        .interact_text()?;

    Ok(address.trim().to_owned())
}

/// Asks whether the historical search should be started.
pub(crate) fn historical_search(dormant: bool) -> Result<bool> {
    let prompt = if dormant {
        "No recent activity, search the last 90 days? (this can take a few minutes)"
    } else {
        "Search the last 90 days too? (this can take a few minutes)"
    };

    let answer = Confirm::with_theme(&*THEME)
        .with_prompt(prompt)
        .default(dormant)
        .interact_opt()?;

    Ok(answer.unwrap_or(false))
}
