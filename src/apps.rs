//! The application registry: the fixed list of launchable apps behind the
//! start menu, plus the small user-dialog helpers the apps share.

use wasm_bindgen::JsValue;

use crate::{browser, desktop, editor, notepad, terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppId {
    Terminal,
    Browser,
    Notepad,
    CamViewer,
    PythonEditor,
}

impl AppId {
    pub const ALL: [AppId; 5] = [
        AppId::Terminal,
        AppId::Browser,
        AppId::Notepad,
        AppId::CamViewer,
        AppId::PythonEditor,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AppId::Terminal => "Terminal",
            AppId::Browser => "Browser",
            AppId::Notepad => "Notepad",
            AppId::CamViewer => "Insecam Viewer",
            AppId::PythonEditor => "Python Editor",
        }
    }

    pub fn launch(&self) {
        match self {
            AppId::Terminal => terminal::launch(),
            AppId::Browser => browser::launch(),
            AppId::Notepad => notepad::launch(),
            AppId::CamViewer => launch_cam_viewer(),
            AppId::PythonEditor => editor::launch(),
        }
    }
}

/// The viewer is a bare window around an iframe pinned to the camera
/// directory; no controls to wire.
fn launch_cam_viewer() {
    let _ = desktop::create_window(
        "Insecam Viewer",
        r#"<iframe src="https://www.insecam.org/" style="width:100%; height:100%; border:none;"></iframe>"#,
        800.0,
        600.0,
    );
}

/// Blocking alert dialog; the failure surface for store errors and input
/// validation.
pub fn alert(message: &str) {
    if let Some(win) = web_sys::window() {
        let _ = win.alert_with_message(message);
    }
}

/// Blocking prompt dialog; `None` when cancelled.
pub fn prompt(message: &str, default: &str) -> Option<String> {
    let win = web_sys::window()?;
    win.prompt_with_message_and_default(message, default)
        .ok()
        .flatten()
}

/// Current date/time as the browser's locale string, for default titles.
pub fn timestamp() -> String {
    js_sys::Date::new_0()
        .to_locale_string("en-US", &JsValue::UNDEFINED)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_titles() {
        let titles: Vec<&str> = AppId::ALL.iter().map(|a| a.title()).collect();
        assert_eq!(
            titles,
            vec![
                "Terminal",
                "Browser",
                "Notepad",
                "Insecam Viewer",
                "Python Editor"
            ]
        );
    }
}
