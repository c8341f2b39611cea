//! Desktop shell: start menu, clock, window materialization, taskbar tray.
//!
//! Renders into fixed elements the host page supplies: `#desktop`,
//! `#start-menu-button`, `#start-menu`, `#clock`, `#windows-container` and
//! `#program-tray`. Window state lives in [`crate::wm`]; this module applies
//! its decisions to the page and wires pointer events back into it.

use std::cell::{Cell, RefCell};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MouseEvent, Node};

use crate::apps::AppId;
use crate::wm::{Geometry, MaximizeChange, WindowManager};

thread_local! {
    static WM: RefCell<WindowManager> = const { RefCell::new(WindowManager::new()) };
    static DRAG_LISTENERS_INSTALLED: Cell<bool> = const { Cell::new(false) };
}

fn with_wm<R>(f: impl FnOnce(&mut WindowManager) -> R) -> R {
    WM.with(|wm| f(&mut wm.borrow_mut()))
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn viewport() -> (f64, f64) {
    let win = match web_sys::window() {
        Some(w) => w,
        None => return (0.0, 0.0),
    };
    let w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (w, h)
}

fn style_of(el: &Element) -> Option<web_sys::CssStyleDeclaration> {
    el.dyn_ref::<HtmlElement>().map(|h| h.style())
}

fn apply_geometry(el: &Element, g: Geometry) {
    if let Some(style) = style_of(el) {
        let _ = style.set_property("left", &format!("{}px", g.x));
        let _ = style.set_property("top", &format!("{}px", g.y));
        let _ = style.set_property("width", &format!("{}px", g.w));
        let _ = style.set_property("height", &format!("{}px", g.h));
    }
}

fn window_element(doc: &Document, id: u32) -> Option<Element> {
    doc.get_element_by_id(&format!("win-{}", id))
}

/// The desktop shell, exported so the host page can boot it once the DOM is
/// ready.
#[wasm_bindgen]
pub struct Desktop;

#[wasm_bindgen]
impl Desktop {
    /// Reveal the desktop and wire the shell chrome.
    #[wasm_bindgen]
    pub fn boot() {
        let doc = match document() {
            Some(d) => d,
            None => return,
        };
        if let Some(desktop) = doc.get_element_by_id("desktop") {
            if let Some(style) = style_of(&desktop) {
                let _ = style.set_property("display", "flex");
            }
        }
        start_clock(&doc);
        wire_start_menu(&doc);
        install_drag_listeners(&doc);
        web_sys::console::log_1(&"desktop shell booted".into());
    }
}

fn start_clock(doc: &Document) {
    let clock = match doc.get_element_by_id("clock") {
        Some(el) => el,
        None => return,
    };
    let tick = Closure::<dyn FnMut()>::new(move || {
        let now: String = js_sys::Date::new_0().to_locale_time_string("en-US").into();
        clock.set_text_content(Some(&now));
    });
    if let Some(win) = web_sys::window() {
        let _ = win.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            1000,
        );
    }
    tick.forget();
}

fn wire_start_menu(doc: &Document) {
    let menu = match doc.get_element_by_id("start-menu") {
        Some(el) => el,
        None => return,
    };
    let button = match doc.get_element_by_id("start-menu-button") {
        Some(el) => el,
        None => return,
    };

    // One entry per registered app; launching closes the menu.
    for app in AppId::ALL {
        if let Ok(item) = doc.create_element("div") {
            item.set_class_name("start-menu-item");
            item.set_text_content(Some(app.title()));
            let menu_ref = menu.clone();
            let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
                app.launch();
                let _ = menu_ref.class_list().add_1("hidden");
            });
            let _ =
                item.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
            on_click.forget();
            let _ = menu.append_child(&item);
        }
    }

    let menu_ref = menu.clone();
    let on_toggle = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
        e.stop_propagation();
        let _ = menu_ref.class_list().toggle("hidden");
    });
    let _ = button.add_event_listener_with_callback("click", on_toggle.as_ref().unchecked_ref());
    on_toggle.forget();

    // Click-away closes the menu.
    let on_doc_click = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
        let target = e.target().and_then(|t| t.dyn_into::<Node>().ok());
        let inside_menu = menu.contains(target.as_ref());
        let on_button = button.is_same_node(target.as_ref());
        if !inside_menu && !on_button {
            let _ = menu.class_list().add_1("hidden");
        }
    });
    let _ = doc.add_event_listener_with_callback("click", on_doc_click.as_ref().unchecked_ref());
    on_doc_click.forget();
}

/// Handle to a materialized window; apps query their controls out of the
/// content region.
pub struct WindowHandle {
    id: u32,
    content: Element,
}

impl WindowHandle {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn content(&self) -> &Element {
        &self.content
    }

    pub fn query(&self, selector: &str) -> Option<Element> {
        self.content.query_selector(selector).ok().flatten()
    }
}

/// Materialize a floating window with the given content markup and wire its
/// chrome (focus, drag, minimize, maximize, close).
pub fn create_window(title: &str, content_html: &str, w: f64, h: f64) -> Option<WindowHandle> {
    let doc = document()?;
    let container = doc.get_element_by_id("windows-container")?;
    let (vw, vh) = viewport();

    let (id, geometry, z) = with_wm(|wm| {
        let id = wm.create(
            title,
            w,
            h,
            vw,
            vh,
            js_sys::Math::random(),
            js_sys::Math::random(),
        );
        let win = wm.get(id).cloned();
        (id, win.as_ref().map(|w| w.geometry), win.map(|w| w.z))
    });
    let (geometry, z) = match (geometry, z) {
        (Some(g), Some(z)) => (g, z),
        _ => return None,
    };

    let root = doc.create_element("div").ok()?;
    root.set_class_name("window");
    root.set_id(&format!("win-{}", id));
    apply_geometry(&root, geometry);
    if let Some(style) = style_of(&root) {
        let _ = style.set_property("z-index", &z.to_string());
    }
    root.set_inner_html(&format!(
        r#"
        <div class="window-header">
            <span class="window-title">{}</span>
            <div class="window-controls">
                <button class="minimize-button">_</button>
                <button class="maximize-button">&#9633;</button>
                <button class="close-button">X</button>
            </div>
        </div>
        <div class="window-content">{}</div>
    "#,
        title, content_html
    ));
    container.append_child(&root).ok()?;

    wire_focus(&root, id);
    wire_drag(&root, id);
    wire_minimize(&doc, &root, id, title);
    wire_maximize(&root, id);
    wire_close(&doc, &root, id);

    let content = root.query_selector(".window-content").ok().flatten()?;
    Some(WindowHandle { id, content })
}

fn wire_focus(root: &Element, id: u32) {
    let el = root.clone();
    let on_down = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
        if let Some(z) = with_wm(|wm| wm.focus(id)) {
            if let Some(style) = style_of(&el) {
                let _ = style.set_property("z-index", &z.to_string());
            }
        }
    });
    let _ = root.add_event_listener_with_callback("mousedown", on_down.as_ref().unchecked_ref());
    on_down.forget();
}

fn wire_drag(root: &Element, id: u32) {
    let header = match root.query_selector(".window-header").ok().flatten() {
        Some(el) => el,
        None => return,
    };
    let win_el = root.clone();
    let grab = header.clone();
    let on_down = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
        e.prevent_default();
        let rect = win_el.get_bounding_client_rect();
        with_wm(|wm| {
            wm.begin_drag(
                id,
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        });
        if let Some(style) = style_of(&grab) {
            let _ = style.set_property("cursor", "grabbing");
        }
    });
    let _ = header.add_event_listener_with_callback("mousedown", on_down.as_ref().unchecked_ref());
    on_down.forget();
}

/// Pointer-move and pointer-up are document-level and shared by all windows;
/// installed once.
fn install_drag_listeners(doc: &Document) {
    if DRAG_LISTENERS_INSTALLED.with(|f| f.replace(true)) {
        return;
    }

    let move_doc = doc.clone();
    let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
        let moved = with_wm(|wm| wm.drag_to(e.client_x() as f64, e.client_y() as f64));
        if let Some((id, x, y)) = moved {
            e.prevent_default();
            if let Some(el) = window_element(&move_doc, id) {
                if let Some(style) = style_of(&el) {
                    let _ = style.set_property("left", &format!("{}px", x));
                    let _ = style.set_property("top", &format!("{}px", y));
                }
            }
        }
    });
    let _ = doc.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref());
    on_move.forget();

    let up_doc = doc.clone();
    let on_up = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
        if let Some(id) = with_wm(|wm| wm.end_drag()) {
            if let Some(el) = window_element(&up_doc, id) {
                if let Some(header) = el.query_selector(".window-header").ok().flatten() {
                    if let Some(style) = style_of(&header) {
                        let _ = style.set_property("cursor", "grab");
                    }
                }
            }
        }
    });
    let _ = doc.add_event_listener_with_callback("mouseup", on_up.as_ref().unchecked_ref());
    on_up.forget();
}

fn wire_minimize(doc: &Document, root: &Element, id: u32, title: &str) {
    let button = match root.query_selector(".minimize-button").ok().flatten() {
        Some(el) => el,
        None => return,
    };
    let win_el = root.clone();
    let tray_doc = doc.clone();
    let title = title.to_string();
    let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
        if !with_wm(|wm| wm.minimize(id)) {
            return;
        }
        if let Some(style) = style_of(&win_el) {
            let _ = style.set_property("display", "none");
        }
        add_tray_entry(&tray_doc, &win_el, id, &title);
    });
    let _ = button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
    on_click.forget();
}

/// A tray entry references its window by element id; it never outlives the
/// window because close removes both.
fn add_tray_entry(doc: &Document, win_el: &Element, id: u32, title: &str) {
    let tray = match doc.get_element_by_id("program-tray") {
        Some(el) => el,
        None => return,
    };
    let item = match doc.create_element("div") {
        Ok(el) => el,
        Err(_) => return,
    };
    item.set_class_name("program-tray-item");
    item.set_text_content(Some(title));
    let _ = item.set_attribute("data-window-id", &format!("win-{}", id));

    let entry = item.clone();
    let win_el = win_el.clone();
    let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
        if let Some(z) = with_wm(|wm| wm.restore(id)) {
            if let Some(style) = style_of(&win_el) {
                let _ = style.set_property("display", "flex");
                let _ = style.set_property("z-index", &z.to_string());
            }
        }
        entry.remove();
    });
    let _ = item.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
    on_click.forget();
    let _ = tray.append_child(&item);
}

fn remove_tray_entry(doc: &Document, id: u32) {
    if let Some(tray) = doc.get_element_by_id("program-tray") {
        if let Some(item) = tray
            .query_selector(&format!("[data-window-id=\"win-{}\"]", id))
            .ok()
            .flatten()
        {
            item.remove();
        }
    }
}

fn wire_maximize(root: &Element, id: u32) {
    let button = match root.query_selector(".maximize-button").ok().flatten() {
        Some(el) => el,
        None => return,
    };
    let win_el = root.clone();
    let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
        let (vw, vh) = viewport();
        match with_wm(|wm| wm.toggle_maximize(id, vw, vh)) {
            Some(MaximizeChange::Maximized(g)) => {
                apply_geometry(&win_el, g);
                if let Some(style) = style_of(&win_el) {
                    let _ = style.set_property("resize", "none");
                }
            }
            Some(MaximizeChange::Restored(g)) => {
                apply_geometry(&win_el, g);
                if let Some(style) = style_of(&win_el) {
                    let _ = style.set_property("resize", "both");
                }
            }
            None => {}
        }
    });
    let _ = button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
    on_click.forget();
}

fn wire_close(doc: &Document, root: &Element, id: u32) {
    let button = match root.query_selector(".close-button").ok().flatten() {
        Some(el) => el,
        None => return,
    };
    let win_el = root.clone();
    let close_doc = doc.clone();
    let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
        with_wm(|wm| wm.close(id));
        win_el.remove();
        remove_tray_entry(&close_doc, id);
    });
    let _ = button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
    on_click.forget();
}
