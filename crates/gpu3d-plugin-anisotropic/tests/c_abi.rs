use std::ffi::{CStr, CString};
use std::io::Write;

use gpu3d_plugin::CallToolResult;
use gpu3d_plugin::ffi::PluginApi;
use gpu3d_plugin_anisotropic::{CreatePlugin, DestroyPlugin, FreePluginResponse};

const CONFIG: &str = r#"
[backend]
kind = "simulated"

[[backend.adapters]]
name = "Adapter 0"
features = [{ feature_type = 3, value_type = 4 }]

[[backend.adapters]]
name = "Adapter 1"
features = [{ feature_type = 3, value_type = 4 }]
fail_set = 1073741830
"#;

fn call(api: &PluginApi, body: &str) -> CallToolResult {
    let request = CString::new(body).unwrap();
    let raw = unsafe { (api.handle_request)(request.as_ptr()) };
    let text = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_owned();
    unsafe { FreePluginResponse(raw) };
    CallToolResult::from_json(&text).unwrap()
}

#[test]
fn host_lifecycle() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    // SAFETY: single test in this binary.
    unsafe { std::env::set_var("GPU3D_PLUGIN_CONFIG", file.path()) };

    let api = unsafe { &*CreatePlugin() };
    let name = unsafe { CStr::from_ptr((api.get_name)()) };
    assert_eq!(name.to_str().unwrap(), "set-anisotropic");
    let tool = unsafe { &*(api.get_tool)(0) };
    assert_eq!(unsafe { CStr::from_ptr(tool.name) }.to_str().unwrap(), "set_anisotropic");

    // Requests before initialize are refused.
    assert!(call(api, r#"{"mode":1}"#).is_error);
    assert_eq!((api.initialize)(), 1);

    let result = call(api, r#"{"mode":3}"#);
    assert!(!result.is_error);
    assert_eq!(
        result.text_content().unwrap(),
        "Device Index: 0\n  Set Anisotropic Mode: 8X (Flag: 8)\n  Status: Success\n\n\
         Device Index: 1\n  Set Anisotropic Mode: 8X (Flag: 8)\n  Status: Failed\n\n"
    );

    let invalid = call(api, r#"{"params":{"arguments":{"mode":9}}}"#);
    assert!(invalid.is_error);
    assert_eq!(
        invalid.text_content(),
        Some("Unsupported mode. Mode value must be 0~4.")
    );

    let malformed = call(api, "[1,2]");
    assert!(malformed.is_error);

    DestroyPlugin(api);
}
