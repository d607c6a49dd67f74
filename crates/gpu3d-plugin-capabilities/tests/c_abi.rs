//! Drives the exported C ABI the way a host does.

use std::ffi::{CStr, CString};
use std::io::Write;

use gpu3d_plugin::CallToolResult;
use gpu3d_plugin::ffi::PluginApi;
use gpu3d_plugin_capabilities::{CreatePlugin, DestroyPlugin, FreePluginResponse};

const CONFIG: &str = r#"
[backend]
kind = "simulated"

[[backend.adapters]]
name = "Adapter 0"

[[backend.adapters.features]]
feature_type = 3
value_type = 4
per_app_support = true

[[backend.adapters.features]]
feature_type = 1
value_type = 5
custom_value_size = 8
conflicting_features = 16

[[backend.adapters]]
name = "Adapter 1"
fail_probe = 1073741831
"#;

fn call(api: &PluginApi, body: &str) -> CallToolResult {
    let request = CString::new(body).unwrap();
    let raw = unsafe { (api.handle_request)(request.as_ptr()) };
    assert!(!raw.is_null());
    let text = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_owned();
    unsafe { FreePluginResponse(raw) };
    CallToolResult::from_json(&text).unwrap()
}

#[test]
fn host_lifecycle() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    // SAFETY: this is the only test in the binary touching the environment.
    unsafe { std::env::set_var("GPU3D_PLUGIN_CONFIG", file.path()) };

    let api = CreatePlugin();
    assert!(!api.is_null());
    let api = unsafe { &*api };

    let name = unsafe { CStr::from_ptr((api.get_name)()) };
    assert_eq!(name.to_str().unwrap(), "get-3d-capabilities");
    assert_eq!((api.get_type)(), 0);
    assert_eq!((api.get_tool_count)(), 1);
    assert!((api.get_tool)(1).is_null());

    let tool = unsafe { &*(api.get_tool)(0) };
    let tool_name = unsafe { CStr::from_ptr(tool.name) };
    assert_eq!(tool_name.to_str().unwrap(), "get_3d_capabilities");
    let schema = unsafe { CStr::from_ptr(tool.input_schema) };
    let schema: serde_json::Value = serde_json::from_str(schema.to_str().unwrap()).unwrap();
    assert_eq!(schema["additionalProperties"], false);

    assert_eq!((api.initialize)(), 1);

    let result = call(api, "{}");
    assert!(!result.is_error);
    let text = result.text_content().unwrap();
    assert!(text.starts_with("Device Index: 0\n"));
    assert!(text.contains("  Feature: Anisotropic Filtering (Type: 3)\n"));
    assert!(text.contains("    Value Type: CUSTOM (5)\n"));
    assert!(text.contains("    Custom Value Size: 8\n"));
    assert!(text.contains("    Conflicting Features: 16\n"));
    assert!(!text.contains("Device Index: 1"));

    // Arguments are ignored.
    let enveloped = call(
        api,
        r#"{"params":{"name":"get_3d_capabilities","arguments":{"x":1}}}"#,
    );
    assert_eq!(enveloped.text_content(), Some(text));

    let bad = call(api, "{not json");
    assert!(bad.is_error);
    assert!(bad.text_content().unwrap().starts_with("Invalid JSON request"));

    (api.shutdown)();
    assert!(call(api, "{}").is_error);

    DestroyPlugin(api);
}
