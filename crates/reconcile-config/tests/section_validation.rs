//! Section validation tests for reconcile-config.
// crates/reconcile-config/tests/section_validation.rs
// =============================================================================
// Module: Section Validation Tests
// Description: Defaults and fail-closed checks for every config section.
// Purpose: Ensure parsed config resolves into valid engine inputs.
// =============================================================================

use reconcile_config::ConfigError;
use reconcile_config::ReconcileConfig;
use reconcile_config::detect_memory_ceiling_mb;
use reconcile_store_sqlite::SqliteStoreMode;
use reconcile_store_sqlite::SqliteSyncMode;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<ReconcileConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn config_with(extra: &str, schema: &str) -> String {
    format!(
        r#"
[store]
path = "store.sqlite"
{extra}

[schema]
{schema}
"#
    )
}

const ITEM_TABLE: &str = r#"
[[schema.tables]]
name = "Item"
create = "CREATE TABLE IF NOT EXISTS Item (id INTEGER, name TEXT)"
"#;

fn schema_v(version: u32) -> String {
    format!("version = {version}\n{ITEM_TABLE}")
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn defaults_fill_optional_sections() -> TestResult {
    let config = ReconcileConfig::from_toml(&config_with("", &schema_v(3)))
        .map_err(|err| err.to_string())?;
    let store = config.store_config();
    if store.busy_timeout_ms != 5_000
        || store.journal_mode != SqliteStoreMode::Wal
        || store.sync_mode != SqliteSyncMode::Full
    {
        return Err("store defaults not applied".to_string());
    }
    let options = config.options();
    if options.backup_suffix != "_temp" || options.batch_size.get() != 500 {
        return Err("option defaults not applied".to_string());
    }
    if config.logging.level != "info" {
        return Err("logging default not applied".to_string());
    }
    let declaration = config.declaration().map_err(|err| err.to_string())?;
    if declaration.version().get() != 3 || declaration.tables().len() != 1 {
        return Err("declaration not built".to_string());
    }
    config.reconciler().map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn store_pragmas_are_parsed() -> TestResult {
    let config = ReconcileConfig::from_toml(&config_with(
        "busy_timeout_ms = 250\njournal_mode = \"delete\"\nsync_mode = \"normal\"",
        &schema_v(1),
    ))
    .map_err(|err| err.to_string())?;
    let store = config.store_config();
    if store.busy_timeout_ms != 250
        || store.journal_mode != SqliteStoreMode::Delete
        || store.sync_mode != SqliteSyncMode::Normal
    {
        return Err("store pragmas not parsed".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Batch Sizing
// ============================================================================

#[test]
fn memory_ceiling_selects_batch_tier() -> TestResult {
    for (ceiling, expected) in [(16, 62), (20, 125), (24, 125), (64, 500)] {
        let content = format!(
            "{}\n[batch]\nmemory_ceiling_mb = {ceiling}\n",
            config_with("", &schema_v(1))
        );
        let config = ReconcileConfig::from_toml(&content).map_err(|err| err.to_string())?;
        let rows = config.options().batch_size.get();
        if rows != expected {
            return Err(format!("ceiling {ceiling} gave {rows} rows, expected {expected}"));
        }
    }
    Ok(())
}

#[test]
fn untiered_batch_keeps_baseline() -> TestResult {
    let content = format!(
        "{}\n[batch]\nbaseline_rows = 40\nmemory_ceiling_mb = 8\ntiered = false\n",
        config_with("", &schema_v(1))
    );
    let config = ReconcileConfig::from_toml(&content).map_err(|err| err.to_string())?;
    if config.options().batch_size.get() != 40 {
        return Err("untiered policy should keep the baseline".to_string());
    }
    Ok(())
}

#[test]
fn detected_ceiling_feeds_batch_policy() -> TestResult {
    let mut config = ReconcileConfig::from_toml(&config_with("", &schema_v(1)))
        .map_err(|err| err.to_string())?;
    if config.batch.detected_ceiling_mb != detect_memory_ceiling_mb() {
        return Err("host ceiling was not detected at load".to_string());
    }
    config.batch.detected_ceiling_mb = Some(16);
    if config.options().batch_size.get() != 62 {
        return Err("detected 16 MiB ceiling should select the smallest tier".to_string());
    }
    config.batch.detected_ceiling_mb = Some(20);
    if config.options().batch_size.get() != 125 {
        return Err("detected 20 MiB ceiling should select the middle tier".to_string());
    }
    Ok(())
}

#[test]
fn configured_ceiling_overrides_detection() -> TestResult {
    let content =
        format!("{}\n[batch]\nmemory_ceiling_mb = 64\n", config_with("", &schema_v(1)));
    let mut config = ReconcileConfig::from_toml(&content).map_err(|err| err.to_string())?;
    if config.batch.detected_ceiling_mb.is_some() {
        return Err("detection should be skipped when a ceiling is configured".to_string());
    }
    config.batch.detected_ceiling_mb = Some(8);
    if config.batch.effective_ceiling_mb() != Some(64) || config.options().batch_size.get() != 500
    {
        return Err("configured ceiling should win over the detected one".to_string());
    }
    Ok(())
}

#[test]
fn untiered_batch_skips_detection() -> TestResult {
    let content = format!("{}\n[batch]\ntiered = false\n", config_with("", &schema_v(1)));
    let config = ReconcileConfig::from_toml(&content).map_err(|err| err.to_string())?;
    if config.batch.detected_ceiling_mb.is_some() {
        return Err("untiered policy should not probe host memory".to_string());
    }
    Ok(())
}

#[test]
fn zero_baseline_rows_rejected() -> TestResult {
    let content =
        format!("{}\n[batch]\nbaseline_rows = 0\n", config_with("", &schema_v(1)));
    assert_invalid(ReconcileConfig::from_toml(&content), "batch.baseline_rows")
}

#[test]
fn zero_memory_ceiling_rejected() -> TestResult {
    let content =
        format!("{}\n[batch]\nmemory_ceiling_mb = 0\n", config_with("", &schema_v(1)));
    assert_invalid(ReconcileConfig::from_toml(&content), "batch.memory_ceiling_mb")
}

// ============================================================================
// SECTION: Schema and Store
// ============================================================================

#[test]
fn zero_version_rejected() -> TestResult {
    assert_invalid(ReconcileConfig::from_toml(&config_with("", &schema_v(0))), "schema.version")
}

#[test]
fn version_beyond_store_range_rejected() -> TestResult {
    assert_invalid(
        ReconcileConfig::from_toml(&config_with("", &schema_v(3_000_000_000))),
        "exceeds maximum",
    )
}

#[test]
fn empty_table_list_rejected() -> TestResult {
    assert_invalid(ReconcileConfig::from_toml(&config_with("", "version = 1")), "schema:")
}

#[test]
fn duplicate_tables_rejected() -> TestResult {
    let schema = format!("version = 1\n{ITEM_TABLE}\n{}", ITEM_TABLE.replace("Item\"", "ITEM\""));
    assert_invalid(ReconcileConfig::from_toml(&config_with("", &schema)), "schema:")
}

#[test]
fn removed_table_cannot_be_declared() -> TestResult {
    let schema = format!("version = 1\nremoved_tables = [\"item\"]\n{ITEM_TABLE}");
    assert_invalid(ReconcileConfig::from_toml(&config_with("", &schema)), "schema:")
}

#[test]
fn empty_backup_suffix_rejected() -> TestResult {
    let schema = format!("version = 1\nbackup_suffix = \"\"\n{ITEM_TABLE}");
    assert_invalid(ReconcileConfig::from_toml(&config_with("", &schema)), "schema.backup_suffix")
}

#[test]
fn empty_store_path_rejected() -> TestResult {
    let content = format!("[store]\npath = \"  \"\n\n[schema]\n{}", schema_v(1));
    assert_invalid(ReconcileConfig::from_toml(&content), "store.path must be non-empty")
}

#[test]
fn missing_store_section_rejected() -> TestResult {
    let content = format!("[schema]\n{}", schema_v(1));
    assert_invalid(ReconcileConfig::from_toml(&content), "config parse error")
}

#[test]
fn unknown_log_level_rejected() -> TestResult {
    let content =
        format!("{}\n[logging]\nlevel = \"loud\"\n", config_with("", &schema_v(1)));
    assert_invalid(ReconcileConfig::from_toml(&content), "logging.level")
}
