//! Notepad app: a textarea whose contents persist as named notes in the
//! `notepad_notes` partition. Notes are only ever added and read back; there
//! is no in-place edit or delete.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlSelectElement, HtmlTextAreaElement, MouseEvent};

use crate::apps::{alert, prompt, timestamp};
use crate::desktop;
use crate::store::{Partition, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Store-assigned; absent until the record is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub title: String,
    pub content: String,
}

/// Whitespace-only content is rejected before any store call.
pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

/// Display label for the note list.
pub fn note_label(note: &Note) -> String {
    if note.title.is_empty() {
        format!("Note {}", note.id.unwrap_or(0))
    } else {
        note.title.clone()
    }
}

const CONTENT: &str = r#"
    <div style="display: flex; flex-direction: column; height: 100%;">
        <textarea class="notepad-textarea" style="flex-grow: 1; width: 100%; border: none; resize: none; padding: 10px; box-sizing: border-box;"></textarea>
        <div style="padding: 5px; background-color: #eee; border-top: 1px solid #ccc; text-align: right;">
            <button class="notepad-save-button" style="padding: 5px 10px; background-color: #333; color: white; border: none; border-radius: 3px; cursor: pointer;">Save</button>
            <button class="notepad-load-button" style="padding: 5px 10px; background-color: #333; color: white; border: none; border-radius: 3px; cursor: pointer;">Load</button>
            <select class="notepad-select-note" style="padding: 5px; border: 1px solid #ccc; border-radius: 3px; margin-left: 5px;"></select>
        </div>
    </div>
"#;

pub fn launch() {
    let handle = match desktop::create_window("Notepad", CONTENT, 500.0, 400.0) {
        Some(h) => h,
        None => return,
    };
    let textarea = match handle
        .query(".notepad-textarea")
        .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok())
    {
        Some(el) => el,
        None => return,
    };
    let select = match handle
        .query(".notepad-select-note")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
    {
        Some(el) => el,
        None => return,
    };

    if let Some(save) = handle.query(".notepad-save-button") {
        let textarea = textarea.clone();
        let select = select.clone();
        let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
            let content = textarea.value();
            if is_blank(&content) {
                alert("Note cannot be empty.");
                return;
            }
            let title = match prompt("Enter note title:", &format!("Note {}", timestamp())) {
                Some(t) if !t.is_empty() => t,
                _ => return,
            };
            let select = select.clone();
            spawn_local(async move {
                let note = Note {
                    id: None,
                    title,
                    content,
                };
                match save_note(&note).await {
                    Ok(_) => {
                        alert("Note saved!");
                        refresh_list(&select).await;
                    }
                    Err(e) => alert(&e),
                }
            });
        });
        let _ = save.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
        on_click.forget();
    }

    if let Some(load) = handle.query(".notepad-load-button") {
        let textarea = textarea.clone();
        let select = select.clone();
        let on_click = Closure::<dyn FnMut(MouseEvent)>::new(move |_: MouseEvent| {
            let selected = select.value();
            let id = match selected.parse::<u32>() {
                Ok(id) => id,
                Err(_) => {
                    alert("Please select a note to load.");
                    return;
                }
            };
            let textarea = textarea.clone();
            spawn_local(async move {
                match load_note(id).await {
                    Ok(Some(note)) => {
                        textarea.set_value(&note.content);
                        alert(&format!("Note \"{}\" loaded.", note.title));
                    }
                    Ok(None) => {}
                    Err(e) => alert(&e),
                }
            });
        });
        let _ = load.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref());
        on_click.forget();
    }

    // Populate the note list on open.
    let select = select.clone();
    spawn_local(async move {
        refresh_list(&select).await;
    });
}

async fn save_note(note: &Note) -> Result<u32, String> {
    let store = Store::open().await.map_err(|e| e.to_string())?;
    store
        .add(Partition::Notes, note)
        .await
        .map_err(|e| e.to_string())
}

async fn load_note(id: u32) -> Result<Option<Note>, String> {
    let store = Store::open().await.map_err(|e| e.to_string())?;
    store
        .get(Partition::Notes, id)
        .await
        .map_err(|e| e.to_string())
}

async fn refresh_list(select: &HtmlSelectElement) {
    let notes = match Store::open().await {
        Ok(store) => match store.get_all::<Note>(Partition::Notes).await {
            Ok(notes) => notes,
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
    append_option(select, "", "-- Select Note --");
    for note in &notes {
        if let Some(id) = note.id {
            append_option(select, &id.to_string(), &note_label(note));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_content_rejected() {
        assert!(is_blank(""));
        assert!(is_blank("   \n\t"));
        assert!(!is_blank("hello"));
    }

    #[test]
    fn test_unsaved_note_serializes_without_id() {
        let note = Note {
            id: None,
            title: "groceries".into(),
            content: "eggs".into(),
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(!json.contains("\"id\""));

        let stored = format!("{{\"id\":7,{}}}", &json[1..json.len() - 1]);
        let back: Note = serde_json::from_str(&stored).unwrap();
        assert_eq!(back.id, Some(7));
        assert_eq!(back.title, note.title);
        assert_eq!(back.content, note.content);
    }

    #[test]
    fn test_note_label_fallback() {
        let untitled = Note {
            id: Some(3),
            title: String::new(),
            content: "x".into(),
        };
        assert_eq!(note_label(&untitled), "Note 3");
        let titled = Note {
            id: Some(3),
            title: "plans".into(),
            content: "x".into(),
        };
        assert_eq!(note_label(&titled), "plans");
    }
}
