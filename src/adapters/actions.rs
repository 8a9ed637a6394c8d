//! Fire-and-forget system actions
//!
//! Launches applications, adjusts volume, opens URLs, and performs power
//! actions by spawning platform commands. Nothing here blocks on the
//! spawned process; success means the command launched.

use std::process::Command;

use super::ActionRunner;

/// A system action requested by voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemAction {
    /// Launch an application by spoken name
    OpenApp(String),
    /// Raise output volume
    VolumeUp,
    /// Lower output volume
    VolumeDown,
    /// Power the machine off
    Shutdown,
    /// Reboot the machine
    Restart,
    /// Lock the workstation
    Lock,
    /// Open a URL in the default browser
    OpenUrl(String),
}

/// Build a web search URL for a spoken term
#[must_use]
pub fn web_search_url(term: &str) -> String {
    format!("https://www.google.com/search?q={}", urlencoding::encode(term))
}

/// Runs actions by spawning platform processes
#[derive(Debug, Default)]
pub struct ProcessActions;

impl ProcessActions {
    /// Create an action runner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ActionRunner for ProcessActions {
    fn run(&self, action: &SystemAction) -> bool {
        let command = match action {
            SystemAction::OpenApp(name) => {
                let Some(argv) = app_command(name) else {
                    tracing::debug!(app = %name, "no mapping for application");
                    return false;
                };
                argv
            }
            SystemAction::VolumeUp => volume_command(true),
            SystemAction::VolumeDown => volume_command(false),
            SystemAction::Shutdown => power_command("shutdown"),
            SystemAction::Restart => power_command("restart"),
            SystemAction::Lock => power_command("lock"),
            SystemAction::OpenUrl(url) => open_url_command(url),
        };

        spawn(&command)
    }
}

/// Spawn argv detached, returning whether the launch succeeded
fn spawn(argv: &[String]) -> bool {
    let Some((program, args)) = argv.split_first() else {
        return false;
    };

    match Command::new(program).args(args).spawn() {
        Ok(_) => {
            tracing::info!(command = %argv.join(" "), "action launched");
            true
        }
        Err(e) => {
            tracing::warn!(command = %argv.join(" "), error = %e, "action failed to launch");
            false
        }
    }
}

fn owned(argv: &[&str]) -> Vec<String> {
    argv.iter().map(ToString::to_string).collect()
}

/// Map a spoken application name to a launch command
#[cfg(target_os = "linux")]
fn app_command(name: &str) -> Option<Vec<String>> {
    let argv: &[&str] = match name.trim() {
        "notepad" | "text editor" => &["gedit"],
        "calculator" => &["gnome-calculator"],
        "files" | "file explorer" | "explorer" => &["nautilus"],
        "terminal" | "console" => &["gnome-terminal"],
        "chrome" => &["google-chrome"],
        "firefox" => &["firefox"],
        "vscode" | "visual studio code" | "code" => &["code"],
        _ => return None,
    };
    Some(owned(argv))
}

#[cfg(target_os = "macos")]
fn app_command(name: &str) -> Option<Vec<String>> {
    let app = match name.trim() {
        "notepad" | "text editor" => "TextEdit",
        "calculator" => "Calculator",
        "files" | "file explorer" | "explorer" => "Finder",
        "terminal" | "console" => "Terminal",
        "chrome" => "Google Chrome",
        "firefox" => "Firefox",
        "vscode" | "visual studio code" | "code" => "Visual Studio Code",
        _ => return None,
    };
    Some(owned(&["open", "-a", app]))
}

#[cfg(target_os = "windows")]
fn app_command(name: &str) -> Option<Vec<String>> {
    let program = match name.trim() {
        "notepad" | "text editor" => "notepad.exe",
        "calculator" => "calc.exe",
        "paint" => "mspaint.exe",
        "files" | "file explorer" | "explorer" => "explorer.exe",
        "terminal" | "console" | "command prompt" => "cmd.exe",
        "chrome" => "chrome.exe",
        "firefox" => "firefox.exe",
        "edge" => "msedge.exe",
        "vscode" | "visual studio code" | "code" => "code.exe",
        _ => return None,
    };
    Some(owned(&["cmd", "/C", "start", "", program]))
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn app_command(_name: &str) -> Option<Vec<String>> {
    None
}

#[cfg(target_os = "linux")]
fn volume_command(up: bool) -> Vec<String> {
    let delta = if up { "+5%" } else { "-5%" };
    owned(&["pactl", "set-sink-volume", "@DEFAULT_SINK@", delta])
}

#[cfg(target_os = "macos")]
fn volume_command(up: bool) -> Vec<String> {
    let script = if up {
        "set volume output volume ((output volume of (get volume settings)) + 10)"
    } else {
        "set volume output volume ((output volume of (get volume settings)) - 10)"
    };
    owned(&["osascript", "-e", script])
}

#[cfg(target_os = "windows")]
fn volume_command(up: bool) -> Vec<String> {
    let delta = if up { "2000" } else { "-2000" };
    owned(&["nircmd.exe", "changesysvolume", delta])
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn volume_command(_up: bool) -> Vec<String> {
    Vec::new()
}

#[cfg(target_os = "linux")]
fn power_command(kind: &str) -> Vec<String> {
    match kind {
        "shutdown" => owned(&["systemctl", "poweroff"]),
        "restart" => owned(&["systemctl", "reboot"]),
        _ => owned(&["loginctl", "lock-session"]),
    }
}

#[cfg(target_os = "macos")]
fn power_command(kind: &str) -> Vec<String> {
    match kind {
        "shutdown" => owned(&["osascript", "-e", "tell app \"System Events\" to shut down"]),
        "restart" => owned(&["osascript", "-e", "tell app \"System Events\" to restart"]),
        _ => owned(&["pmset", "displaysleepnow"]),
    }
}

#[cfg(target_os = "windows")]
fn power_command(kind: &str) -> Vec<String> {
    match kind {
        "shutdown" => owned(&["shutdown", "/s", "/t", "10"]),
        "restart" => owned(&["shutdown", "/r", "/t", "10"]),
        _ => owned(&["rundll32.exe", "user32.dll,LockWorkStation"]),
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn power_command(_kind: &str) -> Vec<String> {
    Vec::new()
}

#[cfg(target_os = "linux")]
fn open_url_command(url: &str) -> Vec<String> {
    owned(&["xdg-open", url])
}

#[cfg(target_os = "macos")]
fn open_url_command(url: &str) -> Vec<String> {
    owned(&["open", url])
}

#[cfg(target_os = "windows")]
fn open_url_command(url: &str) -> Vec<String> {
    owned(&["cmd", "/C", "start", "", url])
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn open_url_command(url: &str) -> Vec<String> {
    owned(&[url])
}
