//! Events published by the controller to whatever renders the widget.

use uuid::Uuid;

use crate::{notifications::Notification, view::WidgetView};

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    ViewChanged(WidgetView),
    Notification(Notification),
    NotificationDismissed(Uuid),
    /// The mint button went back to idle after a mint attempt.
    MintFinished,
    /// The wallet switched chains; the host must rebuild the controller.
    ReloadRequested,
}
