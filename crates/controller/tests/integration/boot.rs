use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;
use steward_controller::{BasicModelController, ControllerConfig, ModelController, PathAddress, PersistenceError, handler_fn, null_cancellable};
use tempfile::TempDir;

use crate::common::{init_tracing, op};

fn config_for(dir: &TempDir) -> ControllerConfig {
	let toml = format!("[persistence]\npath = {:?}\npretty = true\n", dir.path().join("model.json"));
	ControllerConfig::from_toml_str(&toml).unwrap()
}

fn register_set(controller: &BasicModelController) {
	controller
		.register_operation_handler(
			"/subsystem=*".parse().unwrap(),
			"add",
			handler_fn(|ctx, operation, result| {
				let value = operation.param("value").cloned().unwrap_or_default();
				ctx.update(|node| node["value"] = value)?;
				result.handle_result_complete(json!(null));
				Ok(null_cancellable())
			}),
		)
		.unwrap();
}

#[test]
fn model_survives_restart_through_json_file() {
	init_tracing();
	let dir = TempDir::new().unwrap();
	let config = config_for(&dir);

	let first = BasicModelController::from_config(&config).unwrap();
	register_set(&first);
	first.execute_sync(&json!({"operation": "add", "address": "/subsystem=web", "value": 8080})).unwrap();

	let stored = fs::read_to_string(dir.path().join("model.json")).unwrap();
	assert!(stored.contains("\"subsystem\""), "{stored}");

	let second = BasicModelController::from_config(&config).unwrap();
	assert_eq!(second.model().snapshot(), json!({"subsystem": {"web": {"value": 8080}}}));
	assert_eq!(second.config(), &config);
}

#[test]
fn failed_operation_leaves_file_untouched() {
	init_tracing();
	let dir = TempDir::new().unwrap();
	let controller = BasicModelController::from_config(&config_for(&dir)).unwrap();
	register_set(&controller);

	assert!(controller.execute_sync(&op("remove", "/subsystem=web")).is_err());
	assert!(!dir.path().join("model.json").exists());
	assert_eq!(controller.operation_names(&"/subsystem=web".parse::<PathAddress>().unwrap()), vec!["add".to_string()]);
}

#[test]
fn corrupt_model_file_fails_boot() {
	init_tracing();
	let dir = TempDir::new().unwrap();
	fs::write(dir.path().join("model.json"), "{\"subsystem\":").unwrap();

	let booted = BasicModelController::from_config(&config_for(&dir));
	assert!(matches!(booted, Err(PersistenceError::Serialization(_))));
}

#[test]
fn without_path_model_stays_in_memory() {
	init_tracing();
	let controller = BasicModelController::from_config(&ControllerConfig::default()).unwrap();
	register_set(&controller);
	controller.execute_sync(&op("add", "/subsystem=mail")).unwrap();
	assert_eq!(controller.model().snapshot(), json!({"subsystem": {"mail": {"value": null}}}));
}
