/// Upgrade run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeConfig {
    /// Name given to the resolved definition
    pub name: String,

    /// Resolve and report without executing any task
    pub dry_run: bool,

    /// Log the resolved task tree before executing it
    pub log_plan: bool,
}

impl UpgradeConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dry_run: false,
            log_plan: true,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn log_plan(mut self, enabled: bool) -> Self {
        self.log_plan = enabled;
        self
    }

    /// Read overrides from `UPGRADE_NAME`, `UPGRADE_DRY_RUN` and
    /// `UPGRADE_LOG_PLAN`. Unset or unparsable variables keep the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup("UPGRADE_NAME").filter(|name| !name.trim().is_empty()) {
            config.name = name.trim().to_string();
        }
        if let Some(flag) = lookup("UPGRADE_DRY_RUN").as_deref().and_then(parse_flag) {
            config.dry_run = flag;
        }
        if let Some(flag) = lookup("UPGRADE_LOG_PLAN").as_deref().and_then(parse_flag) {
            config.log_plan = flag;
        }
        config
    }
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self::new("upgrade")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
