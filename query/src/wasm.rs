//! Browser binding: take the index the artifact script assigned, then run
//! searches against `location.search` and the live DOM.

use crate::{LoadedIndex, Page, QueryError, QueryRunner, RunnerConfig};
use search_core::InvertedIndex;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    type Element;

    #[wasm_bindgen(js_namespace = document, js_name = getElementById)]
    fn get_element_by_id(id: &str) -> Option<Element>;

    #[wasm_bindgen(method, setter = innerHTML)]
    fn set_inner_html(this: &Element, html: &str);
}

struct DomPage;

impl Page for DomPage {
    fn set_inner_html(&mut self, element_id: &str, html: &str) -> Result<(), QueryError> {
        let element = get_element_by_id(element_id)
            .ok_or_else(|| QueryError::RenderTargetMissing(element_id.to_string()))?;
        element.set_inner_html(html);
        Ok(())
    }
}

/// `undefined` and `null` mean the artifact script never ran.
fn index_from_value(global_name: &str, value: JsValue) -> Result<LoadedIndex, QueryError> {
    let index = if value.is_undefined() || value.is_null() {
        None
    } else {
        let index: InvertedIndex = serde_wasm_bindgen::from_value(value)
            .map_err(|e| QueryError::IndexNotLoaded(format!("`{global_name}` is not a search index: {e}")))?;
        Some(index)
    };
    LoadedIndex::from_global(global_name, index)
}

#[wasm_bindgen]
pub struct SearchPage {
    runner: QueryRunner,
}

#[wasm_bindgen]
impl SearchPage {
    /// `index` is the value the artifact assigned, e.g. `window.SEARCH_INDEX`.
    #[wasm_bindgen(constructor)]
    pub fn new(index: JsValue, global_name: &str) -> Result<SearchPage, JsError> {
        let index = index_from_value(global_name, index)?;
        Ok(SearchPage { runner: QueryRunner::new(index, RunnerConfig::default()) })
    }

    /// Read the index from the global object under `global_name`.
    #[wasm_bindgen(js_name = "fromGlobal")]
    pub fn from_global(global_name: &str) -> Result<SearchPage, JsError> {
        let value = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(global_name))
            .unwrap_or(JsValue::UNDEFINED);
        Self::new(value, global_name)
    }

    /// Render results for `location` (e.g. `window.location.search`); returns the hit count.
    pub fn run(&self, location: &str) -> Result<usize, JsError> {
        let outcome = self.runner.run(location, &mut DomPage)?;
        Ok(outcome.results.len())
    }
}
