//! Push notification construction and click routing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;

/// Action identifier that opens the application.
pub const OPEN_ACTION: &str = "open";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A notification ready to be displayed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

/// Build the notification for a push message.
///
/// The payload text becomes the body as-is (an empty payload stays
/// empty); a push with no payload gets the configured default body.
pub fn build_notification(config: &NotificationConfig, payload: Option<&str>) -> Notification {
    Notification {
        title: config.title.clone(),
        body: payload.map_or_else(|| config.default_body.clone(), str::to_string),
        icon: config.icon.clone(),
        badge: config.badge.clone(),
        vibrate: config.vibrate.clone(),
        tag: config.tag.clone(),
        require_interaction: config.require_interaction,
        actions: config
            .actions
            .iter()
            .map(|a| NotificationAction { action: a.action.clone(), title: a.title.clone() })
            .collect(),
    }
}

/// What a notification click does after the notification is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickRoute {
    /// Only close the notification.
    Close,
    /// Open or focus the application root.
    OpenApp,
}

impl ClickRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickRoute::Close => "close",
            ClickRoute::OpenApp => "open_app",
        }
    }
}

/// Route a click by its action identifier.
///
/// A click on the notification body (no action) opens the app, like the
/// `open` action; any other action only dismisses.
pub fn route_click(action: Option<&str>) -> ClickRoute {
    match action.map(str::trim) {
        None | Some("") | Some(OPEN_ACTION) => ClickRoute::OpenApp,
        Some(_) => ClickRoute::Close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationActionConfig;

    #[test]
    fn test_default_body_without_payload() {
        let n = build_notification(&NotificationConfig::default(), None);
        assert_eq!(n.title, "Operação ATA");
        assert_eq!(n.body, "Hora de estudar!");
        assert_eq!(n.icon, "./assets/icon-192.png");
        assert_eq!(n.badge, "./assets/icon-192.png");
        assert_eq!(n.vibrate, vec![200, 100, 200]);
        assert_eq!(n.tag, "study-reminder");
        assert!(!n.require_interaction);
        assert!(n.actions.is_empty());
    }

    #[test]
    fn test_payload_becomes_body() {
        let n = build_notification(&NotificationConfig::default(), Some("Simulado em 10 minutos"));
        assert_eq!(n.body, "Simulado em 10 minutos");

        let empty = build_notification(&NotificationConfig::default(), Some(""));
        assert_eq!(empty.body, "");
    }

    #[test]
    fn test_actions_copied() {
        let config = NotificationConfig {
            actions: vec![
                NotificationActionConfig { action: "open".into(), title: "Estudar".into() },
                NotificationActionConfig { action: "dismiss".into(), title: "Depois".into() },
            ],
            require_interaction: true,
            ..Default::default()
        };
        let n = build_notification(&config, None);
        assert_eq!(n.actions.len(), 2);
        assert_eq!(n.actions[0].action, "open");
        assert!(n.require_interaction);
    }

    #[test]
    fn test_route_click() {
        assert_eq!(route_click(Some("open")), ClickRoute::OpenApp);
        assert_eq!(route_click(None), ClickRoute::OpenApp);
        assert_eq!(route_click(Some("")), ClickRoute::OpenApp);
        assert_eq!(route_click(Some("dismiss")), ClickRoute::Close);
    }
}
