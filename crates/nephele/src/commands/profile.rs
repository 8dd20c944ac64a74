//! Profile management command implementations

use anyhow::Context;
use nephele_core::config::CredentialStore;
use nephele_core::{Config, Profile, ResilienceConfig};
use serde_json::{Value, json};
use tabled::{Table, Tabled, settings::Style};
use tracing::{debug, info, warn};

use super::utils::{EMPTY_CELL, or_dash, print_structured};
use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{NepheleError, Result as CliResult};

const MASK: &str = "********";

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DEFAULT")]
    default: String,
    #[tabled(rename = "REGION")]
    region: String,
    #[tabled(rename = "CREDENTIALS")]
    credentials: String,
    #[tabled(rename = "ENDPOINT")]
    endpoint: String,
}

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match profile_cmd {
        ProfileCommands::List => handle_list(conn_mgr, output_format, query),
        ProfileCommands::Path => handle_path(conn_mgr, output_format, query),
        ProfileCommands::Show { name } => handle_show(
            conn_mgr,
            name.as_deref().or(profile_name),
            output_format,
            query,
        ),
        ProfileCommands::Set {
            name,
            region,
            access_key_id,
            secret_access_key,
            session_token,
            endpoint_url,
            max_attempts,
            operation_timeout_secs,
            #[cfg(feature = "secure-storage")]
            use_keyring,
        } => {
            let profile = Profile {
                region: region.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: session_token.clone(),
                endpoint_url: endpoint_url.clone(),
                resilience: resilience_from_args(*max_attempts, *operation_timeout_secs),
            };
            #[cfg(feature = "secure-storage")]
            let use_keyring = *use_keyring;
            #[cfg(not(feature = "secure-storage"))]
            let use_keyring = false;

            handle_set(conn_mgr, name, profile, use_keyring)
        }
        ProfileCommands::Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
        ProfileCommands::Validate => handle_validate(conn_mgr, output_format, query),
    }
}

fn resilience_from_args(
    max_attempts: Option<u32>,
    operation_timeout_secs: Option<u64>,
) -> Option<ResilienceConfig> {
    if max_attempts.is_none() && operation_timeout_secs.is_none() {
        return None;
    }
    let defaults = ResilienceConfig::default();
    Some(ResilienceConfig {
        max_attempts: max_attempts.unwrap_or(defaults.max_attempts),
        operation_timeout_secs: operation_timeout_secs.or(defaults.operation_timeout_secs),
    })
}

/// Where a profile's credentials come from
fn credential_source(profile: &Profile) -> &'static str {
    let fields = [&profile.access_key_id, &profile.secret_access_key];
    if fields
        .iter()
        .any(|f| f.as_deref().is_some_and(CredentialStore::is_keyring_reference))
    {
        "keyring"
    } else if profile.has_static_credentials() {
        "static"
    } else if fields.iter().any(|f| f.is_some()) {
        "incomplete"
    } else {
        "default chain"
    }
}

/// Show the first four characters of an access key id
fn mask_access_key(value: &str) -> String {
    if CredentialStore::is_keyring_reference(value) {
        return value.to_string();
    }
    let prefix: String = value.chars().take(4).collect();
    format!("{}****", prefix)
}

fn mask_secret(value: &str) -> String {
    if CredentialStore::is_keyring_reference(value) {
        value.to_string()
    } else {
        MASK.to_string()
    }
}

fn masked_profile_json(name: &str, profile: &Profile, is_default: bool) -> Value {
    json!({
        "name": name,
        "is_default": is_default,
        "region": profile.region,
        "access_key_id": profile.access_key_id.as_deref().map(mask_access_key),
        "secret_access_key": profile.secret_access_key.as_deref().map(mask_secret),
        "session_token": profile.session_token.as_deref().map(mask_secret),
        "endpoint_url": profile.endpoint_url,
        "credentials": credential_source(profile),
        "resilience": profile.resilience,
    })
}

fn handle_list(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    debug!("Listing all configured profiles");
    let config = &conn_mgr.config;
    let profiles = config.list_profiles();
    let config_path = conn_mgr.resolved_config_path().ok();

    let profile_list: Vec<Value> = profiles
        .iter()
        .map(|(name, profile)| {
            let is_default = config.default_profile.as_deref() == Some(name.as_str());
            masked_profile_json(name, profile, is_default)
        })
        .collect();
    let data = json!({
        "config_path": config_path.as_ref().map(|p| p.display().to_string()),
        "default_profile": config.default_profile,
        "profiles": profile_list,
        "count": profiles.len(),
    });
    if print_structured(&data, output_format, query)? {
        return Ok(());
    }

    if let Some(path) = &config_path {
        println!("Configuration file: {}", path.display());
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'nephele profile set' to create a profile.");
        return Ok(());
    }

    let rows: Vec<ProfileRow> = profiles
        .iter()
        .map(|(name, profile)| ProfileRow {
            name: (*name).clone(),
            default: if config.default_profile.as_deref() == Some(name.as_str()) {
                "*".to_string()
            } else {
                String::new()
            },
            region: or_dash(profile.region.as_deref()),
            credentials: credential_source(profile).to_string(),
            endpoint: or_dash(profile.endpoint_url.as_deref()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);
    Ok(())
}

fn handle_path(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let path = conn_mgr.resolved_config_path()?;
    let data = json!({ "config_path": path.display().to_string() });
    if !print_structured(&data, output_format, query)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let config = &conn_mgr.config;
    let name = config.resolve_required_profile(name)?;
    let profile = config.require_profile(&name)?;
    let is_default = config.default_profile.as_deref() == Some(name.as_str());
    debug!("Showing profile {}", name);

    if print_structured(
        masked_profile_json(&name, profile, is_default),
        output_format,
        query,
    )? {
        return Ok(());
    }

    println!(
        "Profile: {}{}",
        name,
        if is_default { " (default)" } else { "" }
    );
    println!("Region:            {}", or_dash(profile.region.as_deref()));
    println!(
        "Access key id:     {}",
        profile
            .access_key_id
            .as_deref()
            .map_or_else(|| EMPTY_CELL.to_string(), mask_access_key)
    );
    println!(
        "Secret access key: {}",
        profile
            .secret_access_key
            .as_deref()
            .map_or_else(|| EMPTY_CELL.to_string(), mask_secret)
    );
    println!(
        "Session token:     {}",
        profile
            .session_token
            .as_deref()
            .map_or_else(|| EMPTY_CELL.to_string(), mask_secret)
    );
    println!("Credentials:       {}", credential_source(profile));
    println!("Endpoint URL:      {}", or_dash(profile.endpoint_url.as_deref()));
    if let Some(resilience) = &profile.resilience {
        println!("Max attempts:      {}", resilience.max_attempts);
        if let Some(timeout) = resilience.operation_timeout_secs {
            println!("Operation timeout: {}s", timeout);
        }
    }
    Ok(())
}

/// Keyring references held by a profile
fn keyring_references(profile: &Profile) -> Vec<&str> {
    [
        &profile.access_key_id,
        &profile.secret_access_key,
        &profile.session_token,
    ]
    .into_iter()
    .flatten()
    .map(String::as_str)
    .filter(|value| CredentialStore::is_keyring_reference(value))
    .collect()
}

/// References in `previous` that `current` no longer uses
fn stale_keyring_references(previous: &Profile, current: Option<&Profile>) -> Vec<String> {
    let kept = current.map(keyring_references).unwrap_or_default();
    keyring_references(previous)
        .into_iter()
        .filter(|reference| !kept.contains(reference))
        .map(str::to_string)
        .collect()
}

/// Delete keyring entries; failures only warn
fn delete_keyring_entries(references: &[String]) {
    if references.is_empty() {
        return;
    }
    let store = CredentialStore::new();
    for reference in references {
        if let Err(e) = store.delete_credential(reference) {
            warn!("Could not delete keyring entry {}: {}", reference, e);
        }
    }
}

/// Move the profile's secrets into the OS keyring, keeping references
fn store_in_keyring(name: &str, profile: &mut Profile) -> CliResult<()> {
    let store = CredentialStore::new();
    if store.storage_backend() != "keyring" {
        return Err(NepheleError::Config(
            "OS keyring is not available on this system".to_string(),
        ));
    }

    let fields = [
        ("access-key-id", &mut profile.access_key_id),
        ("secret-access-key", &mut profile.secret_access_key),
        ("session-token", &mut profile.session_token),
    ];
    for (suffix, field) in fields {
        if let Some(value) = field.as_deref() {
            let reference = store
                .store_credential(&format!("{}-{}", name, suffix), value)
                .with_context(|| format!("Failed to store {} in keyring", suffix))?;
            *field = Some(reference);
        }
    }
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    mut profile: Profile,
    use_keyring: bool,
) -> CliResult<()> {
    debug!("Setting profile: {}", name);

    let issues = profile.validate();
    if !issues.is_empty() {
        return Err(NepheleError::InvalidInput {
            message: issues.join("; "),
        });
    }

    let mut config = conn_mgr.config.clone();
    let previous = config.profiles.get(name).cloned();

    if use_keyring && profile.access_key_id.is_some() {
        store_in_keyring(name, &mut profile)?;
        println!("Credentials stored securely in OS keyring");
    }

    // old entries go only once the new config is on disk
    let stale = previous
        .as_ref()
        .map(|previous| stale_keyring_references(previous, Some(&profile)))
        .unwrap_or_default();
    config.set_profile(name.to_string(), profile);

    let is_first = config.profiles.len() == 1 && config.default_profile.is_none();
    if is_first {
        config.default_profile = Some(name.to_string());
    }

    conn_mgr.save_config(&config)?;
    delete_keyring_entries(&stale);
    info!("Profile '{}' saved", name);

    match conn_mgr.resolved_config_path() {
        Ok(path) => println!("Profile '{}' saved to: {}", name, path.display()),
        Err(_) => println!("Profile '{}' saved.", name),
    }
    if is_first {
        println!("Set as default profile.");
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    debug!("Removing profile: {}", name);

    let mut config = conn_mgr.config.clone();
    let was_default = config.default_profile.as_deref() == Some(name);
    let removed = config
        .remove_profile(name)
        .ok_or_else(|| NepheleError::ProfileNotFound {
            name: name.to_string(),
        })?;

    conn_mgr.save_config(&config)?;
    delete_keyring_entries(&stale_keyring_references(&removed, None));
    info!("Profile '{}' removed", name);

    println!("Profile '{}' removed.", name);
    if was_default {
        println!("It was the default profile; set a new one with 'nephele profile default <name>'.");
    }
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> CliResult<()> {
    let mut config = conn_mgr.config.clone();
    config.set_default_profile(name)?;
    conn_mgr.save_config(&config)?;
    info!("Default profile set to '{}'", name);
    println!("Default profile set to '{}'.", name);
    Ok(())
}

fn handle_validate(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let config: &Config = &conn_mgr.config;
    let issues = config.validate();

    let data = json!({
        "valid": issues.is_empty(),
        "profiles": config.profiles.len(),
        "issues": issues,
    });
    if !print_structured(&data, output_format, query)? {
        if issues.is_empty() {
            println!(
                "Configuration is valid ({} profile(s)).",
                config.profiles.len()
            );
        } else {
            println!("Found {} problem(s):", issues.len());
            for issue in &issues {
                println!("  - {}", issue);
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(NepheleError::Config(format!(
            "{} problem(s) in configuration",
            issues.len()
        )))
    }
}
