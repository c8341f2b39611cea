//! Terminal emulator app: a fixed command table with canned responses.
//! Parsing and response text are pure; the DOM layer below only moves
//! strings in and out of the page and schedules the fake ping timers.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlInputElement, KeyboardEvent};

use crate::desktop;

/// Every command the terminal understands. There is no extensibility
/// mechanism; unknown input is echoed back as such.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Echo(String),
    Clear,
    Whoami,
    Date,
    Ls,
    Ping(Option<String>),
    Empty,
    Unknown(String),
}

/// What the UI should do with a command's result.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Lines(Vec<String>),
    Clear,
    /// Start the emulated ping sequence against this host.
    Ping(String),
}

pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let mut parts = trimmed.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let args: Vec<&str> = parts.collect();
    match cmd.as_str() {
        "help" => Command::Help,
        "echo" => Command::Echo(args.join(" ")),
        "clear" => Command::Clear,
        "whoami" => Command::Whoami,
        "date" => Command::Date,
        "ls" => Command::Ls,
        "ping" => Command::Ping(args.first().map(|s| s.to_string())),
        _ => Command::Unknown(trimmed.to_string()),
    }
}

/// Produce the reply for a command. `now` is the preformatted current
/// date/time, supplied by the caller so this stays pure.
pub fn respond(cmd: &Command, now: &str) -> Reply {
    match cmd {
        Command::Help => Reply::Lines(
            [
                "Available commands:",
                "  help - Display this help message",
                "  echo [text] - Display a line of text",
                "  clear - Clear the terminal screen",
                "  whoami - Display current user",
                "  date - Display the current date and time",
                "  ls - List directory contents (emulated)",
                "  ping [host] - Emulated ping command",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ),
        Command::Echo(text) => Reply::Lines(vec![text.clone()]),
        Command::Clear => Reply::Clear,
        Command::Whoami => Reply::Lines(vec!["user".to_string()]),
        Command::Date => Reply::Lines(vec![now.to_string()]),
        Command::Ls => Reply::Lines(vec![
            "  . ..".to_string(),
            "  apps/".to_string(),
            "  documents/".to_string(),
            "  config.sys".to_string(),
        ]),
        Command::Ping(Some(host)) => Reply::Ping(host.clone()),
        Command::Ping(None) => Reply::Lines(vec!["Usage: ping [host]".to_string()]),
        Command::Empty => Reply::Lines(Vec::new()),
        Command::Unknown(line) => Reply::Lines(vec![format!("Unknown command: {}", line)]),
    }
}

pub fn banner() -> Vec<String> {
    vec![
        "Webtop Terminal [Version 1.0.0]".to_string(),
        "(c) 2025 Webtop. All rights reserved.".to_string(),
        String::new(),
        "Type \"help\" for a list of commands.".to_string(),
    ]
}

pub fn ping_header(host: &str) -> String {
    format!("Pinging {} with 32 bytes of data:", host)
}

pub fn ping_reply(host: &str, delay_ms: u32) -> String {
    format!("Reply from {}: bytes=32 time={}ms TTL=64", host, delay_ms)
}

pub fn ping_stats(host: &str) -> Vec<String> {
    vec![
        format!("Ping statistics for {}:", host),
        "    Packets: Sent = 4, Received = 4, Lost = 0 (0% loss),".to_string(),
        "Approximate round trip times in milli-seconds:".to_string(),
        "    Minimum = 10ms, Maximum = 109ms, Average = 50ms".to_string(),
    ]
}

const CONTENT: &str = r#"
    <div class="terminal-output" style="background-color: black; color: #0f0; height: calc(100% - 30px); overflow-y: auto; padding: 5px; font-family: monospace;"></div>
    <input type="text" class="terminal-input" style="width: calc(100% - 10px); background-color: black; color: #0f0; border: none; padding: 5px; outline: none;">
"#;

/// Open a terminal window and wire its input line.
pub fn launch() {
    let handle = match desktop::create_window("Terminal", CONTENT, 700.0, 500.0) {
        Some(h) => h,
        None => return,
    };
    let output = match handle.query(".terminal-output") {
        Some(el) => el,
        None => return,
    };
    let input = match handle
        .query(".terminal-input")
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    {
        Some(el) => el,
        None => return,
    };

    for line in banner() {
        append_line(&output, &line);
    }

    let out = output.clone();
    let field = input.clone();
    let on_key = Closure::<dyn FnMut(KeyboardEvent)>::new(move |e: KeyboardEvent| {
        if e.key() != "Enter" {
            return;
        }
        let line = field.value();
        let line = line.trim().to_string();
        append_line(&out, &format!("> {}", line));
        field.set_value("");
        run(&out, &line);
    });
    input
        .add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())
        .ok();
    on_key.forget();
    let _ = input.focus();
}

fn run(output: &Element, line: &str) {
    let now: String = js_sys::Date::new_0()
        .to_locale_string("en-US", &JsValue::UNDEFINED)
        .into();
    match respond(&parse(line), &now) {
        Reply::Lines(lines) => {
            for l in lines {
                append_line(output, &l);
            }
        }
        Reply::Clear => output.set_inner_html(""),
        Reply::Ping(host) => schedule_ping(output, &host),
    }
    append_line(output, "");
}

/// Fabricated ping: four timed replies a second apart, then statistics.
/// If the window closes first the timers write into a detached node, which
/// is harmless.
fn schedule_ping(output: &Element, host: &str) {
    append_line(output, &ping_header(host));
    let window = match web_sys::window() {
        Some(w) => w,
        None => return,
    };
    for i in 0..4 {
        let out = output.clone();
        let target = host.to_string();
        let reply = Closure::once_into_js(move || {
            let delay = (js_sys::Math::random() * 100.0).floor() as u32 + 10; // 10-109ms
            append_line(&out, &ping_reply(&target, delay));
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            reply.unchecked_ref(),
            i * 1000,
        );
    }
    let out = output.clone();
    let target = host.to_string();
    let stats = Closure::once_into_js(move || {
        for line in ping_stats(&target) {
            append_line(&out, &line);
        }
    });
    let _ =
        window.set_timeout_with_callback_and_timeout_and_arguments_0(stats.unchecked_ref(), 4500);
}

fn append_line(output: &Element, text: &str) {
    if let Some(doc) = output.owner_document() {
        if let Ok(div) = doc.create_element("div") {
            div.set_text_content(Some(text));
            let _ = output.append_child(&div);
            output.set_scroll_top(output.scroll_height());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dispatch() {
        assert_eq!(parse("help"), Command::Help);
        assert_eq!(parse("  CLEAR  "), Command::Clear);
        assert_eq!(parse("echo hello world"), Command::Echo("hello world".into()));
        assert_eq!(parse("ping"), Command::Ping(None));
        assert_eq!(parse("ping 10.0.0.1"), Command::Ping(Some("10.0.0.1".into())));
        assert_eq!(parse(""), Command::Empty);
        assert_eq!(parse("rm -rf /"), Command::Unknown("rm -rf /".into()));
    }

    #[test]
    fn test_respond_canned_lines() {
        match respond(&Command::Help, "") {
            Reply::Lines(lines) => {
                assert_eq!(lines.len(), 8);
                assert!(lines[7].contains("ping"));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
        assert_eq!(
            respond(&Command::Date, "1/2/2025, 3:04:05 PM"),
            Reply::Lines(vec!["1/2/2025, 3:04:05 PM".into()])
        );
        assert_eq!(respond(&Command::Clear, ""), Reply::Clear);
        assert_eq!(
            respond(&Command::Unknown("blorp 1".into()), ""),
            Reply::Lines(vec!["Unknown command: blorp 1".into()])
        );
    }

    #[test]
    fn test_ping_requires_host() {
        assert_eq!(
            respond(&Command::Ping(None), ""),
            Reply::Lines(vec!["Usage: ping [host]".into()])
        );
        assert_eq!(
            respond(&Command::Ping(Some("example.com".into())), ""),
            Reply::Ping("example.com".into())
        );
    }

    #[test]
    fn test_ping_lines() {
        assert_eq!(
            ping_reply("example.com", 42),
            "Reply from example.com: bytes=32 time=42ms TTL=64"
        );
        let stats = ping_stats("example.com");
        assert_eq!(stats.len(), 4);
        assert!(stats[0].contains("example.com"));
    }
}
