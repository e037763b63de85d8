//! Wrappers around the JavaScript objects supplied by the host page.
//!
//! The data source object is expected to expose promise-returning
//! `initialize()`, `listWorksheets()` and `getSummaryData(worksheet)`, plus
//! an optional `onDataChanged(callback)`. The settings object exposes
//! synchronous `get(key)` and `set(key, value)`.

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::{FlexTableError, Result};
use crate::preferences::Preferences;
use crate::types::{SummaryData, WorksheetInfo};

fn js_error(context: &str, value: &JsValue) -> String {
    let detail = value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"));
    format!("{context}: {detail}")
}

fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
}

/// The host's data source object.
#[derive(Clone)]
pub struct HostDataSource {
    inner: JsValue,
}

impl HostDataSource {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }

    async fn call(&self, name: &str, args: &[JsValue]) -> Result<JsValue> {
        let func = method(&self.inner, name).ok_or_else(|| {
            FlexTableError::DataSource(format!("host object has no {name}() method"))
        })?;
        let returned = match args {
            [] => func.call0(&self.inner),
            [a] => func.call1(&self.inner, a),
            _ => func.apply(&self.inner, &args.iter().collect()),
        }
        .map_err(|e| FlexTableError::DataSource(js_error(name, &e)))?;
        let promise = Promise::resolve(&returned);
        JsFuture::from(promise)
            .await
            .map_err(|e| FlexTableError::DataSource(js_error(name, &e)))
    }

    pub async fn initialize(&self) -> Result<()> {
        self.call("initialize", &[]).await.map(|_| ())
    }

    pub async fn list_worksheets(&self) -> Result<Vec<WorksheetInfo>> {
        let value = self.call("listWorksheets", &[]).await?;
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| FlexTableError::DataSource(format!("listWorksheets: {e}")))
    }

    pub async fn fetch_summary_data(&self, worksheet: Option<&str>) -> Result<SummaryData> {
        let arg = worksheet.map_or(JsValue::UNDEFINED, JsValue::from_str);
        let value = self.call("getSummaryData", &[arg]).await?;
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| FlexTableError::DataSource(format!("getSummaryData: {e}")))
    }

    /// Register `callback` for host data-change notifications, if supported.
    pub fn on_data_changed(&self, callback: &Function) -> bool {
        let Some(func) = method(&self.inner, "onDataChanged") else {
            return false;
        };
        match func.call1(&self.inner, callback) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("{}", js_error("onDataChanged", &e));
                false
            }
        }
    }
}

/// The host's settings store.
pub struct HostPreferences {
    inner: JsValue,
}

impl HostPreferences {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }
}

impl Preferences for HostPreferences {
    fn get(&self, key: &str) -> Option<String> {
        let func = method(&self.inner, "get")?;
        func.call1(&self.inner, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let func = method(&self.inner, "set")
            .ok_or_else(|| FlexTableError::Preferences("settings object has no set()".into()))?;
        func.call2(
            &self.inner,
            &JsValue::from_str(key),
            &JsValue::from_str(&value),
        )
        .map(|_| ())
        .map_err(|e| FlexTableError::Preferences(js_error(key, &e)))
    }
}
