//! C ABI exported to the host plugin loader.
//!
//! The host loads a plugin library, calls `CreatePlugin` to obtain a
//! [`PluginApi`] function table, and drives the plugin through it. Strings
//! returned by `get_name`, `get_version` and `get_tool` stay valid until
//! `DestroyPlugin`; each `handle_request` response is owned by the host and
//! must be released with `FreePluginResponse`.
//!
//! Tool crates do not implement any of this by hand: they invoke
//! [`export_plugin!`](crate::export_plugin) with a factory returning their
//! [`PluginHost`], and the macro generates the table and the exported
//! symbols around a static [`PluginSlot`].

use std::any::Any;
use std::ffi::{CStr, CString, c_char, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::error::PluginError;
use crate::host::PluginHost;
use crate::response::CallToolResult;

/// Tool metadata as seen by the host.
#[repr(C)]
#[derive(Debug)]
pub struct PluginTool {
    pub name: *const c_char,
    pub description: *const c_char,
    /// JSON Schema text.
    pub input_schema: *const c_char,
}

/// Unused table slot; always null.
pub type ReservedFn = Option<unsafe extern "C" fn()>;

/// Function table returned by `CreatePlugin`.
#[repr(C)]
pub struct PluginApi {
    pub get_name: extern "C" fn() -> *const c_char,
    pub get_version: extern "C" fn() -> *const c_char,
    pub get_type: extern "C" fn() -> c_int,
    /// Non-zero on success.
    pub initialize: extern "C" fn() -> c_int,
    /// Takes a NUL-terminated UTF-8 request; returns an owned, never null,
    /// NUL-terminated JSON response.
    pub handle_request: unsafe extern "C" fn(*const c_char) -> *mut c_char,
    pub shutdown: extern "C" fn(),
    pub get_tool_count: extern "C" fn() -> c_int,
    /// Null when the index is out of range.
    pub get_tool: extern "C" fn(c_int) -> *const PluginTool,
    pub reserved: [ReservedFn; 4],
}

/// Builds the plugin behind a slot.
pub type HostFactory = fn() -> Result<PluginHost, PluginError>;

const EMPTY: &CStr = c"";

/// Tool records whose pointers reference `_strings`.
struct ToolTable {
    records: Vec<PluginTool>,
    _strings: Vec<[CString; 3]>,
}

// SAFETY: every pointer in `records` points into a `CString` heap buffer
// owned by `_strings`, which is never mutated or dropped before the table.
unsafe impl Send for ToolTable {}
// SAFETY: see above; the table is read-only after construction.
unsafe impl Sync for ToolTable {}

impl ToolTable {
    fn new(host: &PluginHost) -> Self {
        let strings: Vec<[CString; 3]> = host
            .manifest()
            .tools
            .iter()
            .map(|tool| {
                [
                    to_c_string(&tool.name),
                    to_c_string(&tool.description),
                    to_c_string(&tool.input_schema.to_string()),
                ]
            })
            .collect();
        let records = strings
            .iter()
            .map(|[name, description, schema]| PluginTool {
                name: name.as_ptr(),
                description: description.as_ptr(),
                input_schema: schema.as_ptr(),
            })
            .collect();
        Self {
            records,
            _strings: strings,
        }
    }
}

struct PluginInstance {
    host: PluginHost,
    name: CString,
    version: CString,
    tools: ToolTable,
}

impl PluginInstance {
    fn new(host: PluginHost) -> Self {
        Self {
            name: to_c_string(host.name()),
            version: to_c_string(host.version()),
            tools: ToolTable::new(&host),
            host,
        }
    }
}

/// Lazily created plugin instance behind the exported C functions.
pub struct PluginSlot {
    instance: RwLock<Option<Arc<PluginInstance>>>,
}

impl Default for PluginSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginSlot {
    pub const fn new() -> Self {
        Self {
            instance: parking_lot::const_rwlock(None),
        }
    }

    fn get(&self, factory: HostFactory) -> Option<Arc<PluginInstance>> {
        if let Some(instance) = self.instance.read().as_ref() {
            return Some(instance.clone());
        }
        let mut slot = self.instance.write();
        if let Some(instance) = slot.as_ref() {
            return Some(instance.clone());
        }
        match factory() {
            Ok(host) => {
                let instance = Arc::new(PluginInstance::new(host));
                *slot = Some(instance.clone());
                Some(instance)
            }
            Err(err) => {
                error!(error = %err, "plugin could not be created");
                None
            }
        }
    }

    /// Create the instance and return `api`, or null when the factory fails.
    pub fn create(&self, factory: HostFactory, api: &'static PluginApi) -> *const PluginApi {
        guard(|| self.get(factory).map_or(ptr::null(), |_| api as *const PluginApi))
            .unwrap_or(ptr::null())
    }

    /// Shut down and drop the instance. Pointers handed out earlier become
    /// invalid.
    pub fn destroy(&self) {
        let _ = guard(|| {
            if let Some(instance) = self.instance.write().take() {
                instance.host.shutdown();
                debug!(plugin = %instance.host.name(), "plugin destroyed");
            }
        });
    }

    pub fn name(&self, factory: HostFactory) -> *const c_char {
        guard(|| self.get(factory).map(|i| i.name.as_ptr()))
            .ok()
            .flatten()
            .unwrap_or(EMPTY.as_ptr())
    }

    pub fn version(&self, factory: HostFactory) -> *const c_char {
        guard(|| self.get(factory).map(|i| i.version.as_ptr()))
            .ok()
            .flatten()
            .unwrap_or(EMPTY.as_ptr())
    }

    /// Plugin kind code, `-1` when the plugin cannot be created.
    pub fn kind(&self, factory: HostFactory) -> c_int {
        guard(|| self.get(factory).map_or(-1, |i| i.host.kind().code())).unwrap_or(-1)
    }

    pub fn initialize(&self, factory: HostFactory) -> c_int {
        let initialized = guard(|| self.get(factory).is_some_and(|i| i.host.initialize()));
        c_int::from(initialized.unwrap_or(false))
    }

    /// Handle one request and return an owned C string.
    ///
    /// # Safety
    ///
    /// `request` must be null or point to a NUL-terminated string that stays
    /// valid for the duration of the call.
    pub unsafe fn handle_request(&self, factory: HostFactory, request: *const c_char) -> *mut c_char {
        let response = guard(|| {
            let Some(instance) = self.get(factory) else {
                return CallToolResult::from(PluginError::LoadFailed(
                    "plugin could not be created".into(),
                ));
            };
            if request.is_null() {
                return PluginError::InvalidRequestEncoding("null request".into()).into();
            }
            // SAFETY: non-null and NUL-terminated per this function's contract.
            let raw = unsafe { CStr::from_ptr(request) };
            match raw.to_str() {
                Ok(text) => instance.host.handle_request(text),
                Err(err) => {
                    PluginError::InvalidRequestEncoding(format!("request is not UTF-8: {err}"))
                        .into()
                }
            }
        })
        .unwrap_or_else(|message| CallToolResult::error(format!("internal error: {message}")));

        to_c_string(&response.to_json()).into_raw()
    }

    pub fn shutdown(&self, factory: HostFactory) {
        let _ = guard(|| {
            if let Some(instance) = self.get(factory) {
                instance.host.shutdown();
            }
        });
    }

    pub fn tool_count(&self, factory: HostFactory) -> c_int {
        guard(|| {
            self.get(factory)
                .map_or(0, |i| c_int::try_from(i.tools.records.len()).unwrap_or(c_int::MAX))
        })
        .unwrap_or(0)
    }

    /// Tool record at `index`; null when out of range.
    pub fn tool(&self, factory: HostFactory, index: c_int) -> *const PluginTool {
        guard(|| {
            let instance = self.get(factory)?;
            let index = usize::try_from(index).ok()?;
            instance
                .tools
                .records
                .get(index)
                .map(|record| record as *const PluginTool)
        })
        .ok()
        .flatten()
        .unwrap_or(ptr::null())
    }
}

/// Release a response returned by `handle_request`.
///
/// # Safety
///
/// `response` must be null or a pointer returned by `handle_request` that
/// has not been freed yet.
pub unsafe fn free_response(response: *mut c_char) {
    if !response.is_null() {
        // SAFETY: produced by `CString::into_raw` in `handle_request`.
        drop(unsafe { CString::from_raw(response) });
    }
}

/// Build a C string, dropping interior NULs.
pub fn to_c_string(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

fn guard<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|panic| {
        let message = panic_message(panic.as_ref());
        error!(panic = %message, "panic caught at plugin boundary");
        message
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Export the C ABI for a tool plugin.
///
/// `$factory` is a `fn() -> Result<PluginHost, PluginError>`. Generates the
/// function table plus the `CreatePlugin`, `DestroyPlugin` and
/// `FreePluginResponse` symbols. Invoke once per library crate.
#[macro_export]
macro_rules! export_plugin {
    ($factory:path) => {
        static __GPU3D_PLUGIN_SLOT: $crate::ffi::PluginSlot = $crate::ffi::PluginSlot::new();

        extern "C" fn __gpu3d_get_name() -> *const ::std::ffi::c_char {
            __GPU3D_PLUGIN_SLOT.name($factory)
        }

        extern "C" fn __gpu3d_get_version() -> *const ::std::ffi::c_char {
            __GPU3D_PLUGIN_SLOT.version($factory)
        }

        extern "C" fn __gpu3d_get_type() -> ::std::ffi::c_int {
            __GPU3D_PLUGIN_SLOT.kind($factory)
        }

        extern "C" fn __gpu3d_initialize() -> ::std::ffi::c_int {
            __GPU3D_PLUGIN_SLOT.initialize($factory)
        }

        unsafe extern "C" fn __gpu3d_handle_request(
            request: *const ::std::ffi::c_char,
        ) -> *mut ::std::ffi::c_char {
            // SAFETY: the host passes a NUL-terminated request or null.
            unsafe { __GPU3D_PLUGIN_SLOT.handle_request($factory, request) }
        }

        extern "C" fn __gpu3d_shutdown() {
            __GPU3D_PLUGIN_SLOT.shutdown($factory)
        }

        extern "C" fn __gpu3d_get_tool_count() -> ::std::ffi::c_int {
            __GPU3D_PLUGIN_SLOT.tool_count($factory)
        }

        extern "C" fn __gpu3d_get_tool(index: ::std::ffi::c_int) -> *const $crate::ffi::PluginTool {
            __GPU3D_PLUGIN_SLOT.tool($factory, index)
        }

        static __GPU3D_PLUGIN_API: $crate::ffi::PluginApi = $crate::ffi::PluginApi {
            get_name: __gpu3d_get_name,
            get_version: __gpu3d_get_version,
            get_type: __gpu3d_get_type,
            initialize: __gpu3d_initialize,
            handle_request: __gpu3d_handle_request,
            shutdown: __gpu3d_shutdown,
            get_tool_count: __gpu3d_get_tool_count,
            get_tool: __gpu3d_get_tool,
            reserved: [None; 4],
        };

        /// Create the plugin and return its function table, or null.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn CreatePlugin() -> *const $crate::ffi::PluginApi {
            __GPU3D_PLUGIN_SLOT.create($factory, &__GPU3D_PLUGIN_API)
        }

        /// Shut down and release the plugin instance.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn DestroyPlugin(_api: *const $crate::ffi::PluginApi) {
            __GPU3D_PLUGIN_SLOT.destroy()
        }

        /// Release a response string returned by `handle_request`.
        ///
        /// # Safety
        ///
        /// `response` must be null or an unfreed pointer returned by
        /// `handle_request`.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn FreePluginResponse(response: *mut ::std::ffi::c_char) {
            // SAFETY: forwarded caller contract.
            unsafe { $crate::ffi::free_response(response) }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gpu3d_ctl::{SimulatedAdapter, SimulatedConfig, SimulatedControlApi};

    use super::*;
    use crate::config::MapEnvironment;
    use crate::invocation::ToolInvocation;
    use crate::traits::{Tool, ToolContext, ToolOutput};

    struct ModeTool;

    impl Tool for ModeTool {
        fn name(&self) -> &str {
            "echo_mode"
        }
        fn description(&self) -> &str {
            "Echo the mode"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "required": ["mode"] })
        }
        fn execute(
            &self,
            invocation: &ToolInvocation,
            _ctx: &dyn ToolContext,
        ) -> Result<ToolOutput, PluginError> {
            let mode = invocation.integer_in("mode", 0..=4)?;
            if mode == 4 {
                panic!("mode four is cursed");
            }
            Ok(ToolOutput::success(format!("mode {mode}")))
        }
    }

    fn factory() -> Result<PluginHost, PluginError> {
        let sim = SimulatedControlApi::new(SimulatedConfig {
            adapters: vec![SimulatedAdapter::named("gpu0")],
            ..SimulatedConfig::default()
        });
        Ok(PluginHost::new("echo-plugin", "1.0.0", vec![Box::new(ModeTool)])?
            .with_environment(Arc::new(MapEnvironment::new()))
            .with_backend(Arc::new(sim)))
    }

    fn failing_factory() -> Result<PluginHost, PluginError> {
        Err(PluginError::LoadFailed("nope".into()))
    }

    fn request(slot: &PluginSlot, body: &CStr) -> CallToolResult {
        let response = unsafe { slot.handle_request(factory, body.as_ptr()) };
        assert!(!response.is_null());
        let text = unsafe { CStr::from_ptr(response) }.to_str().unwrap().to_owned();
        unsafe { free_response(response) };
        CallToolResult::from_json(&text).unwrap()
    }

    #[test]
    fn metadata_through_slot() {
        let slot = PluginSlot::new();
        let name = unsafe { CStr::from_ptr(slot.name(factory)) };
        assert_eq!(name.to_str().unwrap(), "echo-plugin");
        let version = unsafe { CStr::from_ptr(slot.version(factory)) };
        assert_eq!(version.to_str().unwrap(), "1.0.0");
        assert_eq!(slot.kind(factory), 0);
        assert_eq!(slot.tool_count(factory), 1);
    }

    #[test]
    fn tool_lookup_bounds() {
        let slot = PluginSlot::new();
        assert!(slot.tool(factory, -1).is_null());
        assert!(slot.tool(factory, 1).is_null());

        let tool = slot.tool(factory, 0);
        assert!(!tool.is_null());
        let tool = unsafe { &*tool };
        let name = unsafe { CStr::from_ptr(tool.name) };
        assert_eq!(name.to_str().unwrap(), "echo_mode");
        let schema = unsafe { CStr::from_ptr(tool.input_schema) }.to_str().unwrap();
        let schema: serde_json::Value = serde_json::from_str(schema).unwrap();
        assert_eq!(schema["required"][0], "mode");
    }

    #[test]
    fn lifecycle_through_slot() {
        let slot = PluginSlot::new();
        assert!(request(&slot, c"{\"mode\":1}").is_error);

        assert_eq!(slot.initialize(factory), 1);
        let ok = request(&slot, c"{\"mode\":1}");
        assert!(!ok.is_error);
        assert_eq!(ok.text_content(), Some("mode 1"));

        slot.shutdown(factory);
        assert!(request(&slot, c"{\"mode\":1}").is_error);
    }

    #[test]
    fn null_request_is_encoding_error() {
        let slot = PluginSlot::new();
        slot.initialize(factory);
        let response = unsafe { slot.handle_request(factory, ptr::null()) };
        let text = unsafe { CStr::from_ptr(response) }.to_str().unwrap().to_owned();
        unsafe { free_response(response) };
        let result = CallToolResult::from_json(&text).unwrap();
        assert!(result.is_error);
        assert!(result.text_content().unwrap().contains("null request"));
    }

    #[test]
    fn invalid_utf8_is_encoding_error() {
        let slot = PluginSlot::new();
        slot.initialize(factory);
        let body = CString::new(vec![b'{', 0xff, b'}']).unwrap();
        let result = request(&slot, &body);
        assert!(result.is_error);
        assert!(result.text_content().unwrap().contains("not UTF-8"));
    }

    #[test]
    fn panic_becomes_error_envelope() {
        let slot = PluginSlot::new();
        slot.initialize(factory);
        let result = request(&slot, c"{\"mode\":4}");
        assert!(result.is_error);
        assert_eq!(
            result.text_content(),
            Some("internal error: mode four is cursed")
        );
        assert!(!request(&slot, c"{\"mode\":0}").is_error);
    }

    #[test]
    fn failing_factory_degrades() {
        let slot = PluginSlot::new();
        let api: &'static PluginApi = Box::leak(Box::new(PluginApi {
            get_name: dummy_name,
            get_version: dummy_name,
            get_type: dummy_int,
            initialize: dummy_int,
            handle_request: dummy_request,
            shutdown: dummy_unit,
            get_tool_count: dummy_int,
            get_tool: dummy_tool,
            reserved: [None; 4],
        }));
        assert!(slot.create(failing_factory, api).is_null());
        assert_eq!(slot.initialize(failing_factory), 0);
        assert_eq!(slot.kind(failing_factory), -1);
        assert_eq!(unsafe { CStr::from_ptr(slot.name(failing_factory)) }, c"");
        assert!(slot.tool(failing_factory, 0).is_null());
    }

    extern "C" fn dummy_name() -> *const c_char {
        EMPTY.as_ptr()
    }
    extern "C" fn dummy_int() -> c_int {
        0
    }
    unsafe extern "C" fn dummy_request(_: *const c_char) -> *mut c_char {
        ptr::null_mut()
    }
    extern "C" fn dummy_unit() {}
    extern "C" fn dummy_tool(_: c_int) -> *const PluginTool {
        ptr::null()
    }

    #[test]
    fn destroy_releases_instance() {
        let slot = PluginSlot::new();
        slot.initialize(factory);
        slot.destroy();
        assert!(slot.instance.read().is_none());
        // A later call builds a fresh, uninitialized instance.
        assert!(request(&slot, c"{\"mode\":0}").is_error);
    }

    #[test]
    fn interior_nul_is_stripped() {
        assert_eq!(to_c_string("a\0b").to_str().unwrap(), "ab");
    }
}
