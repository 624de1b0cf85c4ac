use std::fmt;

/// Demo commands, bound to keys in [`crate::keybindings::KeyBindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Quit,
    OpenNext,
    CloseTop,
    Escape,
    BackdropClick,
    ToggleExpand,
    Refresh,
    CloseAll,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Quit => "quit",
            Action::OpenNext => "open",
            Action::CloseTop => "close",
            Action::Escape => "escape",
            Action::BackdropClick => "backdrop",
            Action::ToggleExpand => "expand",
            Action::Refresh => "refresh",
            Action::CloseAll => "close all",
        };
        write!(f, "{}", s)
    }
}
