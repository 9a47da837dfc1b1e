/// Response keys a task may accept. Kept free of any windowing types so the
/// session and task crates never link against the event loop; the app maps
/// raw key codes onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKey {
    D,
    F,
    J,
    K,
    Left,
    Right,
    Digit(u8),
}

impl ResponseKey {
    /// Symbol persisted in the trial log's `response` column.
    pub fn symbol(&self) -> &'static str {
        match self {
            ResponseKey::D => "d",
            ResponseKey::F => "f",
            ResponseKey::J => "j",
            ResponseKey::K => "k",
            ResponseKey::Left => "left",
            ResponseKey::Right => "right",
            ResponseKey::Digit(1) => "1",
            ResponseKey::Digit(2) => "2",
            ResponseKey::Digit(3) => "3",
            ResponseKey::Digit(4) => "4",
            ResponseKey::Digit(5) => "5",
            ResponseKey::Digit(6) => "6",
            ResponseKey::Digit(7) => "7",
            ResponseKey::Digit(8) => "8",
            ResponseKey::Digit(9) => "9",
            ResponseKey::Digit(_) => "0",
        }
    }
}

/// The two universal control keys: abort the whole run, or skip the current
/// block and hand control back to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    Abort,
    Skip,
}
