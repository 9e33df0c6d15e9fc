//! Actions behind `bookdeck config`

use anyhow::{Context, Result};
use bookdeck_config::{env_var_name, ConfigManager, KEYS};
use console::style;

/// Effective settings as TOML, followed by any problems in the file
pub fn show(manager: &ConfigManager) -> Result<String> {
    let config = manager
        .load_effective()
        .with_context(|| format!("Failed to load {}", manager.config_path().display()))?;

    let mut out = format!(
        "{}\n{}",
        style(format!("# {}", manager.config_path().display())).dim(),
        config.to_toml()?
    );

    for problem in manager.problems()? {
        out.push_str(&format!(
            "{} {} (section reset to defaults)\n",
            style("!").yellow().bold(),
            problem
        ));
    }
    Ok(out)
}

/// One effective value
pub fn get(manager: &ConfigManager, key: &str) -> Result<String> {
    Ok(manager.load_effective()?.get(key)?)
}

/// Writes one value to the file
pub fn set(manager: &ConfigManager, key: &str, value: &str) -> Result<String> {
    let config = manager
        .set(key, value)
        .with_context(|| format!("Failed to set {}", key))?;
    Ok(format!(
        "{} {} = {}",
        style("✓").green().bold(),
        key,
        config.get(key)?
    ))
}

/// Creates the file with defaults when it is missing
pub fn init(manager: &ConfigManager) -> Result<String> {
    let path = manager.config_path().display();
    Ok(if manager.initialize()? {
        format!("{} Created {}", style("✓").green().bold(), path)
    } else {
        format!("{} already exists", path)
    })
}

/// Overwrites the file with defaults, keeping a backup
pub fn reset(manager: &ConfigManager) -> Result<String> {
    manager.reset()?;
    Ok(format!(
        "{} Reset {} (previous file at {})",
        style("✓").green().bold(),
        manager.config_path().display(),
        manager.backup_path().display()
    ))
}

/// Every key with the variable that overrides it
pub fn keys() -> String {
    KEYS.iter()
        .map(|key| format!("{:<32} {}\n", key, style(env_var_name(key)).dim()))
        .collect()
}
