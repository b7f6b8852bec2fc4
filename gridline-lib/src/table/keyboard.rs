//! Keyboard navigation between cells

/// Keys handled by the table's scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Enter,
    Space,
}

impl NavKey {
    /// Parses a DOM-style key name (`ArrowUp`, `Home`, `Enter`, ` `...).
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "Up" | "k" => Some(Self::Up),
            "ArrowDown" | "Down" | "j" => Some(Self::Down),
            "ArrowLeft" | "Left" | "h" => Some(Self::Left),
            "ArrowRight" | "Right" | "l" => Some(Self::Right),
            "Home" => Some(Self::Home),
            "End" => Some(Self::End),
            "Enter" => Some(Self::Enter),
            " " | "Space" => Some(Self::Space),
            _ => None,
        }
    }
}

/// What a key press resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Focus moved to `(row, col)`.
    Moved { row: usize, col: usize },
    /// The focused row was activated.
    Activate(usize),
    /// The focused row's selection should flip.
    ToggleSelection(usize),
    /// Nothing to do (no rows, already at an edge, key disabled).
    Ignored,
}

/// Focused cell within the current page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardNav {
    focus: Option<(usize, usize)>,
}

impl KeyboardNav {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focused `(row, col)`, if any.
    pub fn focus(&self) -> Option<(usize, usize)> {
        self.focus
    }

    /// Forgets the focus, e.g. after the page changed.
    pub fn reset(&mut self) {
        self.focus = None;
    }

    /// Keeps the focus inside a `rows x cols` grid.
    pub fn clamp(&mut self, rows: usize, cols: usize) {
        self.focus = match self.focus {
            _ if rows == 0 || cols == 0 => None,
            Some((row, col)) => Some((row.min(rows - 1), col.min(cols - 1))),
            None => None,
        };
    }

    /// Handles a key for a `rows x cols` grid. The first navigation key
    /// focuses the top-left cell.
    pub fn handle(&mut self, key: NavKey, rows: usize, cols: usize, selectable: bool) -> KeyOutcome {
        if rows == 0 || cols == 0 {
            self.focus = None;
            return KeyOutcome::Ignored;
        }
        self.clamp(rows, cols);

        let Some((row, col)) = self.focus else {
            return match key {
                NavKey::Enter | NavKey::Space => KeyOutcome::Ignored,
                _ => self.move_to(0, 0),
            };
        };

        match key {
            NavKey::Up if row > 0 => self.move_to(row - 1, col),
            NavKey::Down if row + 1 < rows => self.move_to(row + 1, col),
            NavKey::Left if col > 0 => self.move_to(row, col - 1),
            NavKey::Right if col + 1 < cols => self.move_to(row, col + 1),
            NavKey::Home if col != 0 => self.move_to(row, 0),
            NavKey::End if col != cols - 1 => self.move_to(row, cols - 1),
            NavKey::Enter => KeyOutcome::Activate(row),
            NavKey::Space if selectable => KeyOutcome::ToggleSelection(row),
            _ => KeyOutcome::Ignored,
        }
    }

    fn move_to(&mut self, row: usize, col: usize) -> KeyOutcome {
        self.focus = Some((row, col));
        KeyOutcome::Moved { row, col }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_key_focuses_origin() {
        let mut nav = KeyboardNav::new();
        assert_eq!(nav.handle(NavKey::Enter, 3, 3, true), KeyOutcome::Ignored);
        assert_eq!(nav.handle(NavKey::Down, 3, 3, true), KeyOutcome::Moved { row: 0, col: 0 });
    }

    #[test]
    fn test_moves_stay_in_bounds() {
        let mut nav = KeyboardNav::new();
        nav.handle(NavKey::Right, 2, 3, false);
        assert_eq!(nav.handle(NavKey::Up, 2, 3, false), KeyOutcome::Ignored);
        assert_eq!(nav.handle(NavKey::End, 2, 3, false), KeyOutcome::Moved { row: 0, col: 2 });
        assert_eq!(nav.handle(NavKey::Right, 2, 3, false), KeyOutcome::Ignored);
        assert_eq!(nav.handle(NavKey::Down, 2, 3, false), KeyOutcome::Moved { row: 1, col: 2 });
        assert_eq!(nav.handle(NavKey::Down, 2, 3, false), KeyOutcome::Ignored);
        assert_eq!(nav.handle(NavKey::Home, 2, 3, false), KeyOutcome::Moved { row: 1, col: 0 });
        assert_eq!(nav.handle(NavKey::Left, 2, 3, false), KeyOutcome::Ignored);
    }

    #[test]
    fn test_enter_and_space() {
        let mut nav = KeyboardNav::new();
        nav.handle(NavKey::Down, 3, 2, false);
        nav.handle(NavKey::Down, 3, 2, false);
        assert_eq!(nav.handle(NavKey::Enter, 3, 2, false), KeyOutcome::Activate(1));
        assert_eq!(nav.handle(NavKey::Space, 3, 2, false), KeyOutcome::Ignored);
        assert_eq!(nav.handle(NavKey::Space, 3, 2, true), KeyOutcome::ToggleSelection(1));
    }

    #[test]
    fn test_focus_clamped_when_page_shrinks() {
        let mut nav = KeyboardNav::new();
        nav.handle(NavKey::Down, 5, 2, false);
        for _ in 0..4 {
            nav.handle(NavKey::Down, 5, 2, false);
        }
        assert_eq!(nav.focus(), Some((4, 0)));
        assert_eq!(nav.handle(NavKey::Up, 2, 2, false), KeyOutcome::Moved { row: 0, col: 0 });
        assert_eq!(nav.handle(NavKey::Down, 0, 2, false), KeyOutcome::Ignored);
        assert_eq!(nav.focus(), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!(NavKey::parse("ArrowLeft"), Some(NavKey::Left));
        assert_eq!(NavKey::parse(" "), Some(NavKey::Space));
        assert_eq!(NavKey::parse("Tab"), None);
    }
}
