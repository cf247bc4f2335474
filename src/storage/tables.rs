use redb::TableDefinition;

/// Key-value entries: storage key -> raw string value (JSON or token)
pub const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// Active session identity (SessionUser JSON)
pub const SESSION_KEY: &str = "aurora-nexus-auth";

/// Active session token (raw string)
pub const TOKEN_KEY: &str = "aurora-nexus-token";

/// Registered accounts (JSON array of Account)
pub const USERS_KEY: &str = "aurora-nexus-users";

/// File registry (JSON array of FileRecord)
pub const FILES_KEY: &str = "aurora-nexus-files";
