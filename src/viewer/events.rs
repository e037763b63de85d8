//! Delegated DOM events and the debounced search box.
//!
//! One click listener sits on the container. Pivot rows and group headers
//! are found by their `data-*` hooks, so repainting the table never needs
//! listeners to be re-bound.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, MouseEvent};

use super::SharedState;

/// Delay before a search keystroke is applied, in milliseconds.
pub(crate) const SEARCH_DEBOUNCE_MS: i32 = 150;

enum ClickAction {
    TogglePivot(String),
    ToggleGroup(usize),
}

fn click_action(target: &Element) -> Option<ClickAction> {
    if let Ok(Some(row)) = target.closest("[data-pivot-key]") {
        return row
            .get_attribute("data-pivot-key")
            .map(ClickAction::TogglePivot);
    }
    if let Ok(Some(header)) = target.closest("[data-group-index]") {
        return header
            .get_attribute("data-group-index")
            .and_then(|v| v.parse().ok())
            .map(ClickAction::ToggleGroup);
    }
    None
}

pub(crate) fn handle_click(state: &Rc<RefCell<SharedState>>, event: &MouseEvent) {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return;
    };
    let Some(action) = click_action(&target) else {
        return;
    };
    let Ok(mut s) = state.try_borrow_mut() else {
        log::warn!("click ignored while the table is busy");
        return;
    };
    let result = match action {
        ClickAction::TogglePivot(key) => s.app.toggle_pivot_key(&key).map(|_| ()),
        ClickAction::ToggleGroup(index) => s.app.toggle_measure_group(index).map(|_| ()),
    };
    if let Err(err) = result {
        log::error!("toggle failed: {err}");
    }
    s.paint_full();
}

/// Apply `term` after [`SEARCH_DEBOUNCE_MS`] unless another keystroke
/// arrives first.
pub(crate) fn schedule_search(state: &Rc<RefCell<SharedState>>, term: String) {
    let token = match state.try_borrow_mut() {
        Ok(mut s) => s.search.issue(),
        Err(_) => return,
    };
    let weak = Rc::downgrade(state);
    let callback = Closure::once_into_js(move || {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let Ok(mut s) = state.try_borrow_mut() else {
            return;
        };
        if !s.search.is_current(token) {
            return;
        }
        s.app.set_search(&term);
        s.paint_visibility();
    });
    let Some(window) = web_sys::window() else {
        return;
    };
    if window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            SEARCH_DEBOUNCE_MS,
        )
        .is_err()
    {
        log::warn!("could not schedule search");
    }
}
