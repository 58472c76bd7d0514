//! Configuration loading: TOML file, then `STEADYQ_*` environment, then flags.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use steadyq_core::QueueConfig;

pub const ENV_PREFIX: &str = "STEADYQ_";

/// `WORKER_COUNT` -> `workerCount`, matching the config file keys.
fn env_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut upper = false;
    for c in raw.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

pub fn figment(path: Option<&Path>, task_type: Option<&str>) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(
        Env::prefixed(ENV_PREFIX)
            .map(|key| env_key(key.as_str()).into())
            .lowercase(false),
    );
    if let Some(task_type) = task_type {
        figment = figment.merge(("taskType", task_type));
    }
    figment
}

pub fn load(path: Option<&Path>, task_type: Option<&str>) -> anyhow::Result<QueueConfig> {
    let config: QueueConfig = figment(path, task_type).extract()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_become_camel_case() {
        assert_eq!(env_key("TASK_TYPE"), "taskType");
        assert_eq!(env_key("FAILURE_COOLDOWN_MILLIS"), "failureCooldownMillis");
        assert_eq!(env_key("workers"), "workers");
    }

    #[test]
    fn toml_then_flag_override() {
        let config: QueueConfig = Figment::new()
            .merge(Toml::string(
                r#"
                taskType = "email"
                workerCount = 3
                restartBackoffSecs = [1, 2]
                "#,
            ))
            .merge(("taskType", "sms"))
            .extract()
            .unwrap();
        assert_eq!(config.task_type, "sms");
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.restart_backoff_secs, [1, 2]);
        assert_eq!(config.key_prefix, "steadyq");
    }
}
