// src/lifecycle.rs
//! One-time setup run when the extension is installed or the browser starts.

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Installed,
    Startup,
}

/// How the side panel reacts to the toolbar action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelBehavior {
    pub open_panel_on_action_click: bool,
}

/// A host's side-panel capability.
pub trait SidePanel: Send + Sync {
    fn set_panel_behavior(&self, behavior: PanelBehavior) -> Result<()>;
}

/// The browser hosting the extension. Hosts without a side panel return `None`.
pub trait ExtensionHost: Send + Sync {
    fn side_panel(&self) -> Option<&dyn SidePanel>;
}

/// Configures the toolbar action to open the panel. Returns whether the
/// host had a side panel to configure.
pub fn handle(host: &dyn ExtensionHost, event: LifecycleEvent) -> Result<bool> {
    if event == LifecycleEvent::Installed {
        log::info!("extension installed");
    }

    let Some(panel) = host.side_panel() else {
        log::info!("host has no side panel, leaving action behavior unchanged");
        return Ok(false);
    };

    panel.set_panel_behavior(PanelBehavior {
        open_panel_on_action_click: true,
    })?;
    log::debug!("side panel opens on action click ({:?})", event);
    Ok(true)
}

/// The command-line host. There is no toolbar and no side panel.
#[derive(Debug, Default)]
pub struct NativeHost;

impl ExtensionHost for NativeHost {
    fn side_panel(&self) -> Option<&dyn SidePanel> {
        None
    }
}
