use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use super::Notifier;
use crate::error::Error;

/// Host notification mechanism, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `notify-send` (libnotify).
    Linux,
    /// `osascript` AppleScript notifications.
    MacOs,
    /// PowerShell toast notifications.
    Windows,
    /// No native mechanism, notifications are printed.
    Other,
}

impl Platform {
    #[must_use]
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }
}

/// Shells out to the host's native notification tool.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    platform: Platform,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}

impl DesktopNotifier {
    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        Self { platform }
    }

    /// Program and arguments that display the notification, if any.
    fn command_line(&self, title: &str, body: &str) -> Option<(&'static str, Vec<String>)> {
        match self.platform {
            Platform::Linux => Some((
                "notify-send",
                vec![
                    "--app-name=upgak".to_string(),
                    title.to_string(),
                    body.to_string(),
                ],
            )),
            Platform::MacOs => Some((
                "osascript",
                vec![
                    "-e".to_string(),
                    format!(
                        "display notification {} with title {}",
                        applescript_string(body),
                        applescript_string(title)
                    ),
                ],
            )),
            Platform::Windows => Some((
                "powershell",
                vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    toast_script(title, body),
                ],
            )),
            Platform::Other => None,
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn name(&self) -> &str {
        match self.platform {
            Platform::Linux => "notify-send",
            Platform::MacOs => "osascript",
            Platform::Windows => "powershell",
            Platform::Other => "console",
        }
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), Error> {
        let Some((program, args)) = self.command_line(title, body) else {
            println!("NOTIFICATION: {title} - {body}");
            return Ok(());
        };

        debug!("Running {program} for notification '{title}'");
        let output = Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Notification(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

fn applescript_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn powershell_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn toast_script(title: &str, body: &str) -> String {
    format!(
        "[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] > $null; \
         $template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); \
         $texts = $template.GetElementsByTagName('text'); \
         $texts.Item(0).AppendChild($template.CreateTextNode({})) > $null; \
         $texts.Item(1).AppendChild($template.CreateTextNode({})) > $null; \
         [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('upgak').Show([Windows.UI.Notifications.ToastNotification]::new($template))",
        powershell_string(title),
        powershell_string(body)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_passes_title_and_body_as_arguments() {
        let notifier = DesktopNotifier::for_platform(Platform::Linux);
        let (program, args) = notifier.command_line("Website Down", "a is down").unwrap();

        assert_eq!(program, "notify-send");
        assert_eq!(args[1..], ["Website Down", "a is down"]);
    }

    #[test]
    fn test_macos_script_escapes_quotes() {
        let notifier = DesktopNotifier::for_platform(Platform::MacOs);
        let (program, args) = notifier
            .command_line("Website Down", r#"x is down: "bad" \ gateway"#)
            .unwrap();

        assert_eq!(program, "osascript");
        assert_eq!(
            args[1],
            r#"display notification "x is down: \"bad\" \\ gateway" with title "Website Down""#
        );
    }

    #[test]
    fn test_windows_script_escapes_single_quotes() {
        let script = toast_script("Website Up", "it's back");
        assert!(script.contains("CreateTextNode('Website Up')"));
        assert!(script.contains("CreateTextNode('it''s back')"));
    }

    #[tokio::test]
    async fn test_unsupported_platform_prints_instead() {
        let notifier = DesktopNotifier::for_platform(Platform::Other);
        assert!(notifier.command_line("t", "b").is_none());
        assert_eq!(notifier.name(), "console");
        assert!(notifier.notify("t", "b").await.is_ok());
    }
}
