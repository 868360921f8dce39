use super::*;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Sample {
	file_name: String,
	len: usize,
}

#[test]
fn result_builder_success() {
	let result: CommandResult<Sample> = ResultBuilder::new("resolve")
		.data(Sample {
			file_name: "index.html".into(),
			len: 12,
		})
		.build();

	assert!(result.ok);
	assert_eq!(result.command, "resolve");
	assert_eq!(result.schema_version, Some(SCHEMA_VERSION));
	assert!(result.error.is_none());
	assert!(result.timings.is_some());
}

#[test]
fn result_builder_error() {
	let result: CommandResult<Sample> = ResultBuilder::new("resolve")
		.error(ErrorCode::ResourceNotFound, "Resource not found: a.css")
		.build();

	assert!(!result.ok);
	assert!(result.data.is_none());
	assert_eq!(result.error.as_ref().unwrap().code, ErrorCode::ResourceNotFound);
}

#[test]
fn error_code_serializes_screaming_snake() {
	let json = serde_json::to_string(&ErrorCode::BridgeSourceMissing).unwrap();
	assert_eq!(json, "\"BRIDGE_SOURCE_MISSING\"");
	assert_eq!(ErrorCode::TabNotFound.to_string(), "TAB_NOT_FOUND");
}

#[test]
fn core_codes_round_trip_through_display() {
	for code in [
		"GROUP_INIT_FAILED",
		"ENGINE_SPAWN_FAILED",
		"BRIDGE_UNINITIALIZED",
		"RESOURCE_NOT_FOUND",
		"NAVIGATION_FAILED",
		"ENGINE_RELEASED",
		"UNSUPPORTED",
	] {
		assert_eq!(ErrorCode::from_core_code(code).as_str(), code);
	}
	assert_eq!(ErrorCode::from_core_code("SOMETHING_NEW"), ErrorCode::InternalError);
}

#[test]
fn output_format_parse() {
	assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
	assert_eq!("TOON".parse::<OutputFormat>().unwrap(), OutputFormat::Toon);
	assert!("yaml".parse::<OutputFormat>().is_err());
}

#[test]
fn serialize_command_result() {
	let result: CommandResult<Sample> = ResultBuilder::new("resolve")
		.data(Sample {
			file_name: "style.css".into(),
			len: 3,
		})
		.diagnostic_with_source(DiagnosticLevel::Warning, "using built-in tabs", "config")
		.build();

	let json = serde_json::to_string(&result).unwrap();
	assert!(json.contains("\"ok\":true"));
	assert!(json.contains("\"fileName\":\"style.css\""));
	assert!(json.contains("\"durationMs\""));
	assert!(json.contains("\"source\":\"config\""));
	assert!(!json.contains("\"error\""));
}
