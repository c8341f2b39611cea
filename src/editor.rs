//! Python script editor app. Scripts persist in the `python_scripts`
//! partition; execution is forwarded verbatim to the Brython interpreter the
//! host page embeds, with its print output routed into the window's output
//! region. This module owns none of the interpreter's semantics.

use js_sys::{Function, Reflect};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlSelectElement, HtmlTextAreaElement, MouseEvent};

use crate::apps::{alert, prompt, timestamp};
use crate::desktop;
use crate::notepad::is_blank;
use crate::store::{Partition, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub title: String,
    pub code: String,
}

pub const DEFAULT_SNIPPET: &str = "print(\"Hello, Webtop Python!\")";

pub fn script_label(script: &Script) -> String {
    if script.title.is_empty() {
        format!("Script {}", script.id.unwrap_or(0))
    } else {
        script.title.clone()
    }
}

const CONTENT: &str = r#"
    <div style="display: flex; flex-direction: column; height: 100%;">
        <textarea class="python-code-editor" style="flex-grow: 1; width: 100%; border: none; resize: none; padding: 10px; box-sizing: border-box; font-family: monospace;">print("Hello, Webtop Python!")</textarea>
        <div style="padding: 5px; background-color: #eee; border-top: 1px solid #ccc; display: flex; justify-content: space-between; align-items: center;">
            <button class="python-run-button" style="padding: 5px 10px; background-color: #333; color: white; border: none; border-radius: 3px; cursor: pointer;">Run Python</button>
            <select class="python-script-select" style="padding: 5px; border: 1px solid #ccc; border-radius: 3px; margin-left: 5px;"></select>
            <button class="python-save-button" style="padding: 5px 10px; background-color: #333; color: white; border: none; border-radius: 3px; cursor: pointer; margin-left: 5px;">Save</button>
        </div>
        <pre class="python-output" style="height: 100px; background-color: black; color: #0f0; overflow-y: auto; padding: 5px; font-family: monospace; margin: 0;"></pre>
    </div>
"#;

pub fn launch() {
    let handle = match desktop::create_window("Python Editor", CONTENT, 700.0, 500.0) {
        Some(h) => h,
        None => return,
    };
    let code_editor = match handle
        .query(".python-code-editor")
        .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok())
    {
        Some(el) => el,
        None => return,
    };
    let select = match handle
        .query(".python-script-select")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
    {
        Some(el) => el,
        None => return,
    };
    let output = match handle.query(".python-output") {
        Some(el) => el,
        None => return,
    };

    if let Some(run) = handle.query(".python-run-button") {
        let code_editor = code_editor.clone();
        let output = output.clone();
        let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
            run_script(&code_editor.value(), &output);
        });
        let _ = run.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
        on_click.forget();
    }

    if let Some(save) = handle.query(".python-save-button") {
        let code_editor = code_editor.clone();
        let select = select.clone();
        let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
            let code = code_editor.value();
            if is_blank(&code) {
                alert("Script cannot be empty.");
                return;
            }
            let title = match prompt("Enter script title:", &format!("Script {}", timestamp())) {
                Some(t) if !t.is_empty() => t,
                _ => return,
            };
            let select = select.clone();
            spawn_local(async move {
                let script = Script {
                    id: None,
                    title,
                    code,
                };
                match save_script(&script).await {
                    Ok(_) => {
                        alert("Script saved!");
                        refresh_list(&select).await;
                    }
                    Err(e) => alert(&e),
                }
            });
        });
        let _ = save.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
        on_click.forget();
    }

    // Selecting a script loads it; "New Script" restores the default snippet.
    {
        let code_editor = code_editor.clone();
        let select_ref = select.clone();
        let on_change = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            let selected = select_ref.value();
            match selected.parse::<u32>() {
                Ok(id) => {
                    let code_editor = code_editor.clone();
                    spawn_local(async move {
                        match load_script(id).await {
                            Ok(Some(script)) => code_editor.set_value(&script.code),
                            Ok(None) => {}
                            Err(e) => alert(&e),
                        }
                    });
                }
                Err(_) => code_editor.set_value(DEFAULT_SNIPPET),
            }
        });
        let _ = select.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref());
        on_change.forget();
    }

    let select = select.clone();
    spawn_local(async move {
        refresh_list(&select).await;
    });
}

async fn save_script(script: &Script) -> Result<u32, String> {
    let store = Store::open().await.map_err(|e| e.to_string())?;
    store
        .add(Partition::Scripts, script)
        .await
        .map_err(|e| e.to_string())
}

async fn load_script(id: u32) -> Result<Option<Script>, String> {
    let store = Store::open().await.map_err(|e| e.to_string())?;
    store
        .get(Partition::Scripts, id)
        .await
        .map_err(|e| e.to_string())
}

async fn refresh_list(select: &HtmlSelectElement) {
    let scripts = match Store::open().await {
        Ok(store) => match store.get_all::<Script>(Partition::Scripts).await {
            Ok(scripts) => scripts,
            Err(e) => {
                alert(&e.to_string());
                return;
            }
        },
        Err(e) => {
            alert(&e.to_string());
            return;
        }
    };
    select.set_inner_html("");
    append_option(select, "", "-- New Script --");
    for script in &scripts {
        if let Some(id) = script.id {
            append_option(select, &id.to_string(), &script_label(script));
        }
    }
}

fn append_option(select: &HtmlSelectElement, value: &str, label: &str) {
    let doc = match select.owner_document() {
        Some(d) => d,
        None => return,
    };
    if let Ok(option) = doc.create_element("option") {
        let _ = option.set_attribute("value", value);
        option.set_text_content(Some(label));
        let _ = select.append_child(&option);
    }
}

/// Forward the raw code to the page-global interpreter, temporarily routing
/// `console.log` into the output region so print output lands there. An
/// interpreter error aborts only this run.
fn run_script(code: &str, output: &Element) {
    output.set_text_content(Some(""));

    let global = js_sys::global();
    let console_obj = match Reflect::get(&global, &"console".into()) {
        Ok(c) => c,
        Err(_) => return,
    };
    let original_log = Reflect::get(&console_obj, &"log".into()).unwrap_or(JsValue::UNDEFINED);

    let out = output.clone();
    let passthrough = original_log.clone();
    let hook = Closure::<dyn FnMut(JsValue)>::new(move |arg: JsValue| {
        let text = arg.as_string().unwrap_or_else(|| format!("{:?}", arg));
        append_output(&out, &text);
        if let Some(f) = passthrough.dyn_ref::<Function>() {
            let _ = f.call1(&JsValue::NULL, &arg);
        }
    });
    let _ = Reflect::set(&console_obj, &"log".into(), hook.as_ref());

    match interpreter_entry(&global) {
        Some((interp, run)) => {
            if let Err(e) = run.call3(
                &interp,
                &JsValue::from_str(code),
                &"__main__".into(),
                &"__main__".into(),
            ) {
                append_output(output, &format!("Error: {}", js_error_text(&e)));
            }
        }
        None => append_output(output, "Error: Python interpreter is not loaded"),
    }

    let _ = Reflect::set(&console_obj, &"log".into(), &original_log);
    // The interpreter may schedule deferred prints; keep the hook alive so a
    // late call cannot hit a dropped closure.
    hook.forget();
}

fn interpreter_entry(global: &JsValue) -> Option<(JsValue, Function)> {
    let interp = Reflect::get(global, &"__BRYTHON__".into()).ok()?;
    if interp.is_undefined() || interp.is_null() {
        return None;
    }
    let run = Reflect::get(&interp, &"run_script".into()).ok()?;
    let run: Function = run.dyn_into().ok()?;
    Some((interp, run))
}

fn append_output(output: &Element, text: &str) {
    let existing = output.text_content().unwrap_or_default();
    output.set_text_content(Some(&format!("{}{}\n", existing, text)));
    output.set_scroll_top(output.scroll_height());
}

fn js_error_text(e: &JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsaved_script_serializes_without_id() {
        let script = Script {
            id: None,
            title: "demo".into(),
            code: DEFAULT_SNIPPET.into(),
        };
        let json = serde_json::to_string(&script).unwrap();
        assert!(!json.contains("\"id\""));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, None);
        assert_eq!(back.code, DEFAULT_SNIPPET);
    }

    #[test]
    fn test_script_label_fallback() {
        let untitled = Script {
            id: Some(12),
            title: String::new(),
            code: String::new(),
        };
        assert_eq!(script_label(&untitled), "Script 12");
    }
}
