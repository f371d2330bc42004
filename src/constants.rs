// Personio API
pub const PERSONIO_BASE_URL: &str = "https://api.personio.de/v1";
pub const AUTH_PATH: &str = "/auth";
pub const EMPLOYEES_PATH: &str = "/company/employees";

// Node types and keys
pub const PLUGIN_NAME: &str = "personio-source";
pub const EMPLOYEE_NODE_TYPE: &str = "Employee";
pub const FILE_NODE_TYPE: &str = "File";
pub const EMPLOYEE_KEY_PREFIX: &str = "employee-";
pub const REMOTE_FILE_KEY_PREFIX: &str = "remote-file-";
pub const PROFILE_PICTURE_CACHE_PREFIX: &str = "profile-picture-";

// Record shape
pub const IDENTIFIER_FIELD: &str = "id";
pub const DEFAULT_ATTACHMENT_FIELD: &str = "profile_picture";

// Local storage layout
pub const DEFAULT_DATA_DIR: &str = "data";
pub const CACHE_DB_FILE: &str = "cache.db";
pub const NODE_SNAPSHOT_FILE: &str = "nodes.json";
pub const FILES_DIR: &str = "files";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
