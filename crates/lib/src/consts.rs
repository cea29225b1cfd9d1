pub const APP_NAME: &str = "kselect";

/// Environment variable naming the build tree root.
pub const SOURCE_ROOT_ENV: &str = "OPENWRT_SRC";

/// Settings file looked up in the working directory when `--settings` is not given.
pub const SETTINGS_FILENAME: &str = "kselect.toml";

pub const DEFAULT_SCHEMA_FILE: &str = "Config.in";
pub const DEFAULT_CONFIG_FILE: &str = ".config";
pub const DEFAULT_PACKAGES_FILE: &str = "packages";
pub const DEFAULT_SYMBOL_PREFIX: &str = "PACKAGE_";

/// Prefix every symbol carries in a persisted `.config`.
pub const CONFIG_PREFIX: &str = "CONFIG_";

pub const DEFAULT_FINALIZE_COMMAND: [&str; 2] = ["make", "oldconfig"];
