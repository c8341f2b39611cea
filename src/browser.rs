//! Browser app: an iframe with a URL bar and an in-memory back/forward
//! history. History is a plain linear list with a current index; navigating
//! from a mid-history point truncates the forward entries.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlIFrameElement, HtmlInputElement, KeyboardEvent, MouseEvent};

use crate::desktop;

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    index: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new navigation, dropping any forward history first.
    pub fn navigate(&mut self, url: String) -> &str {
        if let Some(i) = self.index {
            self.entries.truncate(i + 1);
        }
        self.entries.push(url);
        self.index = Some(self.entries.len() - 1);
        self.current().unwrap_or_default()
    }

    pub fn back(&mut self) -> Option<&str> {
        match self.index {
            Some(i) if i > 0 => {
                self.index = Some(i - 1);
                self.current()
            }
            _ => None,
        }
    }

    pub fn forward(&mut self) -> Option<&str> {
        match self.index {
            Some(i) if i + 1 < self.entries.len() => {
                self.index = Some(i + 1);
                self.current()
            }
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.index.map(|i| self.entries[i].as_str())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

/// Bare hostnames default to https.
pub fn normalize(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url == "about:blank" {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

const CONTENT: &str = r#"
    <div style="display: flex; flex-direction: column; height: 100%;">
        <div style="display: flex; padding: 5px; background-color: #eee; border-bottom: 1px solid #ccc;">
            <input type="text" class="browser-url-input" value="about:blank" style="flex-grow: 1; padding: 5px; border: 1px solid #ccc; border-radius: 3px;">
            <button class="browser-go-button" style="margin-left: 5px; padding: 5px 10px; background-color: #333; color: white; border: none; border-radius: 3px; cursor: pointer;">Go</button>
            <button class="browser-back-button" style="margin-left: 5px; padding: 5px 10px; background-color: #333; color: white; border: none; border-radius: 3px; cursor: pointer;">&lt;</button>
            <button class="browser-forward-button" style="margin-left: 5px; padding: 5px 10px; background-color: #333; color: white; border: none; border-radius: 3px; cursor: pointer;">&gt;</button>
        </div>
        <iframe class="browser-iframe" src="about:blank" style="flex-grow: 1; border: none;"></iframe>
    </div>
"#;

/// Open a browser window and wire navigation. Each window owns its own
/// history; the shared RefCell is only touched from this window's handlers.
pub fn launch() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let handle = match desktop::create_window("Web Browser", CONTENT, 800.0, 600.0) {
        Some(h) => h,
        None => return,
    };
    let url_input = match handle
        .query(".browser-url-input")
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    {
        Some(el) => el,
        None => return,
    };
    let frame = match handle
        .query(".browser-iframe")
        .and_then(|el| el.dyn_into::<HtmlIFrameElement>().ok())
    {
        Some(el) => el,
        None => return,
    };

    let history = Rc::new(RefCell::new(History::new()));

    let show = {
        let url_input = url_input.clone();
        let frame = frame.clone();
        move |url: &str| {
            frame.set_src(url);
            url_input.set_value(url);
        }
    };

    let go = {
        let history = Rc::clone(&history);
        let url_input = url_input.clone();
        let show = show.clone();
        move || {
            let url = normalize(&url_input.value());
            let mut h = history.borrow_mut();
            let current = h.navigate(url).to_string();
            drop(h);
            show(&current);
        }
    };

    // Go button and Enter in the URL bar.
    {
        let go_click = go.clone();
        let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| go_click());
        if let Some(btn) = handle.query(".browser-go-button") {
            let _ =
                btn.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
        }
        on_click.forget();

        let go_key = go.clone();
        let on_key = Closure::<dyn FnMut(KeyboardEvent)>::new(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                go_key();
            }
        });
        let _ =
            url_input.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref());
        on_key.forget();
    }

    wire_step(&handle, ".browser-back-button", {
        let history = Rc::clone(&history);
        let show = show.clone();
        move || {
            if let Some(url) = history.borrow_mut().back().map(str::to_string) {
                show(&url);
            }
        }
    });
    wire_step(&handle, ".browser-forward-button", {
        let history = Rc::clone(&history);
        let show = show.clone();
        move || {
            if let Some(url) = history.borrow_mut().forward().map(str::to_string) {
                show(&url);
            }
        }
    });

    // Initial navigation so back/forward have a baseline entry.
    history.borrow_mut().navigate("about:blank".to_string());
    show("about:blank");
}

fn wire_step(handle: &desktop::WindowHandle, selector: &str, mut action: impl FnMut() + 'static) {
    if let Some(btn) = handle.query(selector) {
        let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| action());
        let _ = btn.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
        on_click.forget();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_back_truncate() {
        let mut h = History::new();
        for url in ["A", "B", "C"] {
            h.navigate(url.to_string());
        }
        assert_eq!(h.index(), Some(2));

        h.navigate("D".to_string());
        assert_eq!(h.entries(), &["A", "B", "C", "D"]);
        assert_eq!(h.index(), Some(3));

        assert_eq!(h.back(), Some("C"));
        assert_eq!(h.back(), Some("B"));
        assert_eq!(h.index(), Some(1));

        h.navigate("new".to_string());
        assert_eq!(h.entries(), &["A", "B", "new"]);
        assert_eq!(h.index(), Some(2));
    }

    #[test]
    fn test_back_forward_bounds() {
        let mut h = History::new();
        assert_eq!(h.back(), None);
        assert_eq!(h.forward(), None);
        h.navigate("A".to_string());
        assert_eq!(h.back(), None);
        assert_eq!(h.forward(), None);
        h.navigate("B".to_string());
        assert_eq!(h.back(), Some("A"));
        assert_eq!(h.forward(), Some("B"));
        assert_eq!(h.forward(), None);
    }

    #[test]
    fn test_normalize_defaults_to_https() {
        assert_eq!(normalize("example.com"), "https://example.com");
        assert_eq!(normalize("http://example.com"), "http://example.com");
        assert_eq!(normalize("https://example.com"), "https://example.com");
        assert_eq!(normalize("about:blank"), "about:blank");
    }
}
