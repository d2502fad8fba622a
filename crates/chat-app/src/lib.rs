pub mod app;
pub mod chat;
pub mod clock;
pub mod settings;
pub mod texts;

pub use app::{AppError, AppResult, HostCommand, build_widget};
pub use chat::{ChatWidget, SendOutcome, WidgetEvent, WidgetView};
pub use clock::{Clock, FixedClock, LocalClock};
pub use settings::{SettingsStore, WidgetSettings};
