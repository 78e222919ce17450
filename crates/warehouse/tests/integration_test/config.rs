use std::env;
use std::sync::Mutex;

use querygate_warehouse::WarehouseConfig;

// Env-based tests must run serially to avoid interfering with each other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for k in [
        "GCP_PROJECT_ID",
        "BQ_DATASET_ID",
        "BQ_TABLE_ID",
        "BQ_ACCESS_TOKEN",
        "PROD_GCP_PROJECT_ID",
        "PROD_BQ_ACCESS_TOKEN",
    ] {
        env::remove_var(k);
    }
}

#[test]
fn profile_selects_prefixed_values() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();

    env::set_var("GCP_PROJECT_ID", "dev-project");
    env::set_var("PROD_GCP_PROJECT_ID", "prod-project");
    env::set_var("PROD_BQ_ACCESS_TOKEN", "prod-token");
    env::set_var("BQ_DATASET_ID", "sales");

    let cfg = WarehouseConfig::from_env_profiled("PROD");

    assert_eq!(cfg.project_id, "prod-project");
    assert_eq!(cfg.access_token.as_deref(), Some("prod-token"));
    assert_eq!(cfg.dataset_id, "sales");
    assert_eq!(cfg.default_table(), "prod-project.sales.your_table_id");

    clear_env();
}

#[test]
fn empty_values_count_as_unset() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env();

    env::set_var("GCP_PROJECT_ID", "");
    env::set_var("BQ_ACCESS_TOKEN", "");

    let cfg = WarehouseConfig::from_env_profiled("");
    assert_eq!(cfg.project_id, "your-gcp-project-id");
    assert_eq!(cfg.access_token, None);

    clear_env();
}
